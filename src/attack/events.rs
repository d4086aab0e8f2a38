use super::best_list::ResultEntry;
use crate::machine::{symbols_to_text, KeySnapshot};
use serde::Serialize;
use std::time::Duration;
use strum_macros::{Display, EnumString};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
pub enum AttackType {
    #[strum(serialize = "Ciphertext-Only")]
    CiphertextOnly,
    #[strum(serialize = "Known-Plaintext")]
    KnownPlaintext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
#[strum(serialize_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// Periodic status of one worker.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub task_id: usize,
    pub attack_type: AttackType,
    /// Phase the worker is in: 1 = random trials, 2 = refinement.
    pub phase: usize,
    pub counter: usize,
    pub target: usize,
    /// Evaluations by all workers since the attack started.
    pub evaluations: u64,
    pub elapsed: Duration,
}

/// Observer for everything the attack manager reports.
///
/// Callbacks may run on any worker thread, always under the best-list lock,
/// so implementations must be quick and must not call back into the list.
pub trait AttackListener: Send + Sync {
    fn on_log(&self, _message: &str, _level: LogLevel) {}
    fn on_new_best_entry(&self, _entry: &ResultEntry<KeySnapshot>, _rank: usize) {}
    fn on_progress(&self, _report: &ProgressReport) {}
}

pub struct NullListener;

impl AttackListener for NullListener {}

/// Turns every event into a `tracing` record.
pub struct TracingListener;

impl AttackListener for TracingListener {
    fn on_log(&self, message: &str, level: LogLevel) {
        match level {
            LogLevel::Debug => debug!("{}", message),
            LogLevel::Info => info!("{}", message),
            LogLevel::Warning => warn!("{}", message),
            LogLevel::Error => error!("{}", message),
        }
    }

    fn on_new_best_entry(&self, entry: &ResultEntry<KeySnapshot>, rank: usize) {
        let preview: String = symbols_to_text(&entry.decryption).chars().take(60).collect();
        info!("🏆 #{} score {:.2}: {}", rank + 1, entry.score, preview);
    }

    fn on_progress(&self, report: &ProgressReport) {
        let secs = report.elapsed.as_secs_f64().max(1e-9);
        info!(
            "⏳ [{}] task {} phase {} {}/{} | {} evals ({:.0}/s) | {:.1}s",
            report.attack_type,
            report.task_id,
            report.phase,
            report.counter,
            report.target,
            report.evaluations,
            report.evaluations as f64 / secs,
            secs
        );
    }
}
