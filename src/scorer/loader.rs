use super::Language;
use crate::consts::ALPHABET_SIZE;
use crate::error::{AttackError, AttackResult};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Raw n-gram counts before they are turned into log weights.
#[derive(Debug, Clone)]
pub struct RawGrams {
    pub mono: [f64; ALPHABET_SIZE],
    pub bigram: Vec<f64>,
}

impl Default for RawGrams {
    fn default() -> Self {
        Self {
            mono: [0.0; ALPHABET_SIZE],
            bigram: vec![0.0; ALPHABET_SIZE * ALPHABET_SIZE],
        }
    }
}

pub fn monogram_path(root: &Path, language: Language) -> PathBuf {
    root.join(format!("{}_1grams.csv", language))
}

pub fn bigram_path(root: &Path, language: Language) -> PathBuf {
    root.join(format!("{}_2grams.csv", language))
}

pub fn sample_path(root: &Path, language: Language) -> PathBuf {
    root.join(format!("{}_sample.txt", language))
}

/// Reads `gram,count` rows. Rows whose gram is not `width` letters or whose
/// count does not parse (a header line, for instance) are skipped.
pub fn load_gram_counts<P: AsRef<Path>>(path: P, width: usize) -> AttackResult<Vec<(Vec<u8>, f64)>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        AttackError::Setup(format!(
            "Could not open n-gram table at '{}': {}",
            path.display(),
            e
        ))
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    let mut skipped = 0;
    for record in rdr.records() {
        let record = record?;
        if record.len() < 2 {
            skipped += 1;
            continue;
        }
        let gram = &record[0];
        if gram.len() != width || !gram.chars().all(|c| c.is_ascii_alphabetic()) {
            skipped += 1;
            continue;
        }
        let count: f64 = match record[1].parse() {
            Ok(v) if f64::is_finite(v) && v >= 0.0 => v,
            _ => {
                skipped += 1;
                continue;
            }
        };
        let symbols = gram
            .bytes()
            .map(|b| b.to_ascii_uppercase() - b'A')
            .collect();
        rows.push((symbols, count));
    }

    if skipped > 0 {
        debug!("Skipped {} rows in {}", skipped, path.display());
    }
    Ok(rows)
}

/// Loads both tables for `language` from `root`.
pub fn load_language(root: &Path, language: Language) -> AttackResult<RawGrams> {
    let mut grams = RawGrams::default();

    let mono_path = monogram_path(root, language);
    for (gram, count) in load_gram_counts(&mono_path, 1)? {
        grams.mono[gram[0] as usize] += count;
    }
    if grams.mono.iter().sum::<f64>() <= 0.0 {
        return Err(AttackError::Setup(format!(
            "Monogram table '{}' has no usable rows",
            mono_path.display()
        )));
    }

    let bi_path = bigram_path(root, language);
    for (gram, count) in load_gram_counts(&bi_path, 2)? {
        grams.bigram[gram[0] as usize * ALPHABET_SIZE + gram[1] as usize] += count;
    }
    if grams.bigram.iter().sum::<f64>() <= 0.0 {
        return Err(AttackError::Setup(format!(
            "Bigram table '{}' has no usable rows",
            bi_path.display()
        )));
    }

    info!("📂 Loaded {} statistics from {}", language, root.display());
    Ok(grams)
}

/// Sample plaintext override for simulations, if the resource directory has one.
pub fn load_sample(root: &Path, language: Language) -> AttackResult<Option<String>> {
    let path = sample_path(root, language);
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(fs::read_to_string(path)?))
}
