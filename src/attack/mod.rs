pub mod best_list;
pub mod ciphertext_only;
pub mod events;
pub mod known_plaintext;
pub mod lugs_hc;
pub mod manager;
pub mod pins_sa;
pub mod simulation;
pub mod state;

pub use best_list::{BestList, PushOutcome, ResultEntry};
pub use events::{AttackListener, AttackType, LogLevel, NullListener, ProgressReport, TracingListener};
pub use manager::{AttackManager, AttackSummary, StopHandle};
pub use state::LocalState;

use crate::consts::PHASE1_REFERENCE_LENGTH;
use crate::error::{AttackError, AttackResult};
use crate::machine::Key;

/// Random trials per cycle: the configured count is for a reference-length
/// message and scales inversely with length, within `1..=10 * configured`.
pub fn phase1_trials(configured: usize, length: usize) -> usize {
    let configured = configured.max(1);
    (configured.saturating_mul(PHASE1_REFERENCE_LENGTH) / length.max(1))
        .clamp(1, configured.saturating_mul(10))
}

/// Rejects a key that cannot be searched for `attack_type`.
fn check_key(manager: &AttackManager, key: &Key, attack_type: AttackType) -> AttackResult<()> {
    if key.ciphertext().is_empty() {
        return Err(AttackError::Setup("Key has no ciphertext".to_string()));
    }
    if key.version() != manager.config().version {
        return Err(AttackError::Setup(format!(
            "Key built for {} but the attack targets {}",
            key.version(),
            manager.config().version
        )));
    }
    if attack_type == AttackType::KnownPlaintext && key.crib().is_none() {
        return Err(AttackError::Setup(
            "Known-plaintext attack without a crib".to_string(),
        ));
    }
    Ok(())
}

/// Debug line at the end of a cycle. Simulation runs also show how far the
/// key in hand is from the original.
fn log_cycle(manager: &AttackManager, key: &Key, state: &LocalState) {
    let mut message = format!(
        "Task {} finished cycle {} with {:.2}",
        state.task_id,
        state.current_cycle + 1,
        state.best_score
    );
    if let (Some(score), Some(pins), Some(lugs)) =
        (key.original_score(), key.incorrect_pins(), key.incorrect_lugs())
    {
        message.push_str(&format!(
            " (original {:.2}, {} wrong pins, {} wrong lugs)",
            score, pins, lugs
        ));
    }
    manager.log(&message, LogLevel::Debug);
}
