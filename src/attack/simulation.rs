use crate::config::AttackConfig;
use crate::error::{AttackError, AttackResult};
use crate::machine::{text_to_symbols, Key, KeySnapshot};
use crate::scorer::{builtin, loader, Language};
use fastrand::Rng;
use tracing::info;

/// A generated message together with the key that produced it.
#[derive(Debug, Clone)]
pub struct SimulationData {
    pub plaintext: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub crib: Option<Vec<Option<u8>>>,
    pub key: KeySnapshot,
}

/// Sample plaintext for `config.language`: the resource directory's
/// `<language>_sample.txt` when present, else the bundled English text.
pub fn sample_text(config: &AttackConfig) -> AttackResult<Vec<u8>> {
    if let Some(root) = &config.resource_path {
        if let Some(text) = loader::load_sample(root, config.language)? {
            let symbols = text_to_symbols(&text);
            if !symbols.is_empty() {
                return Ok(symbols);
            }
        }
    }
    match config.language {
        Language::English => Ok(text_to_symbols(builtin::ENGLISH_SAMPLE)),
        other => Err(AttackError::Setup(format!(
            "No sample text for {}; add {}_sample.txt to the resource path",
            other, other
        ))),
    }
}

/// Encrypts `simulation_length` letters of sample text, taken from a random
/// offset and wrapping around, under a random key for the configured version.
pub fn generate(config: &AttackConfig, rng: &mut Rng) -> AttackResult<SimulationData> {
    let params = &config.simulation;
    if params.simulation_length == 0 {
        return Err(AttackError::Setup(
            "simulation_length must be at least 1".to_string(),
        ));
    }
    if params.simulation_crib_length > params.simulation_length {
        return Err(AttackError::Setup(
            "simulation_crib_length exceeds simulation_length".to_string(),
        ));
    }

    let sample = sample_text(config)?;
    let offset = rng.usize(0..sample.len());
    let plaintext: Vec<u8> = sample
        .iter()
        .cycle()
        .skip(offset)
        .take(params.simulation_length)
        .copied()
        .collect();

    let mut key = Key::new(config.version);
    key.randomize(rng);
    let ciphertext = key.encrypt(&plaintext);

    let crib = (params.simulation_crib_length > 0).then(|| {
        plaintext[..params.simulation_crib_length]
            .iter()
            .map(|&s| Some(s))
            .collect()
    });

    info!(
        "🧪 Simulation: {} letters, crib {}, version {}",
        plaintext.len(),
        params.simulation_crib_length,
        config.version
    );

    Ok(SimulationData {
        plaintext,
        ciphertext,
        crib,
        key: key.snapshot(),
    })
}
