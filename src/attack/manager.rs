use super::best_list::{BestList, PushOutcome, ResultEntry};
use super::events::{AttackListener, AttackType, LogLevel, ProgressReport, TracingListener};
use super::simulation;
use super::state::LocalState;
use super::{ciphertext_only, known_plaintext};
use crate::config::AttackConfig;
use crate::error::{AttackError, AttackResult};
use crate::machine::{parse_crib, symbols_to_text, text_to_symbols, Key, KeySnapshot};
use crate::scorer::{EvalType, Scorer};
use rayon::ThreadPoolBuilder;
use serde_json::json;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Cloneable handle that requests a cooperative stop from another thread.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What an attack run produced.
#[derive(Debug, Clone)]
pub struct AttackSummary {
    pub attack_type: AttackType,
    pub workers: usize,
    pub evaluations: u64,
    pub elapsed: Duration,
    /// Best list at the end of the run, best first.
    pub entries: Vec<ResultEntry<KeySnapshot>>,
    pub failed_workers: usize,
    pub cancelled: bool,
    /// Simulation runs only.
    pub original_key: Option<KeySnapshot>,
    pub original_score: Option<f64>,
}

impl AttackSummary {
    pub fn best(&self) -> Option<&ResultEntry<KeySnapshot>> {
        self.entries.first()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let entries: Vec<_> = self
            .entries
            .iter()
            .map(|e| {
                json!({
                    "score": e.score,
                    "decryption": symbols_to_text(&e.decryption),
                    "lugs": e.key.lugs.to_lug_string(),
                    "pins": e.key.pins.to_bit_strings(),
                    "incorrect_pins": self.original_key.as_ref().map(|o| e.key.incorrect_pins(o)),
                    "incorrect_lugs": self.original_key.as_ref().map(|o| e.key.incorrect_lugs(o)),
                })
            })
            .collect();
        json!({
            "attack_type": self.attack_type.to_string(),
            "workers": self.workers,
            "evaluations": self.evaluations,
            "elapsed_ms": self.elapsed.as_millis() as u64,
            "failed_workers": self.failed_workers,
            "cancelled": self.cancelled,
            "original_score": self.original_score,
            "entries": entries,
        })
    }
}

/// One attack's input, shared read-only by all workers.
struct Target {
    attack_type: AttackType,
    cipher: Arc<[u8]>,
    crib: Option<Arc<[Option<u8>]>>,
    original: Option<(Arc<KeySnapshot>, f64)>,
}

/// Runs attacks: owns the configuration, the scorer, the best list and the
/// stop flag, and fans the search out over worker threads.
pub struct AttackManager {
    config: AttackConfig,
    scorer: Arc<Scorer>,
    best_list: BestList<KeySnapshot>,
    should_stop: Arc<AtomicBool>,
    listener: Arc<dyn AttackListener>,
    epoch: Instant,
    started_ms: AtomicU64,
    next_progress_ms: AtomicU64,
    eval_baseline: AtomicU64,
}

impl AttackManager {
    /// Validates `config` and loads its statistics. Fails before any search
    /// starts when the tables are missing or unusable.
    pub fn new(config: AttackConfig) -> AttackResult<Self> {
        config.validate()?;
        let scorer = Scorer::load(config.language, config.resource_path.as_deref())?;
        Ok(Self::with_scorer(config, Arc::new(scorer)))
    }

    /// Shares an already loaded scorer.
    pub fn with_scorer(config: AttackConfig, scorer: Arc<Scorer>) -> Self {
        let throttle = (config.notify_throttle_ms > 0)
            .then(|| Duration::from_millis(config.notify_throttle_ms));
        Self {
            best_list: BestList::new(config.best_list_size, config.dedup, throttle),
            config,
            scorer,
            should_stop: Arc::new(AtomicBool::new(false)),
            listener: Arc::new(TracingListener),
            epoch: Instant::now(),
            started_ms: AtomicU64::new(0),
            next_progress_ms: AtomicU64::new(0),
            eval_baseline: AtomicU64::new(0),
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn AttackListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn config(&self) -> &AttackConfig {
        &self.config
    }

    pub fn scorer(&self) -> &Arc<Scorer> {
        &self.scorer
    }

    pub fn best_list(&self) -> &BestList<KeySnapshot> {
        &self.best_list
    }

    pub fn stop(&self) {
        self.should_stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.should_stop.clone())
    }

    #[inline(always)]
    pub fn should_stop(&self) -> bool {
        self.should_stop.load(Ordering::Relaxed)
    }

    /// Evaluations since the current (or last) attack started.
    pub fn evaluations(&self) -> u64 {
        self.scorer
            .evaluations()
            .saturating_sub(self.eval_baseline.load(Ordering::Relaxed))
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(
            self.now_ms()
                .saturating_sub(self.started_ms.load(Ordering::Relaxed)),
        )
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    #[inline(always)]
    pub fn evaluate(&self, eval_type: EvalType, key: &mut Key) -> f64 {
        let (decryption, crib) = key.decryption_and_crib();
        self.scorer.evaluate(eval_type, decryption, crib)
    }

    /// Offers `key` to the best list; the stored decryption always covers
    /// the whole ciphertext.
    pub fn push_result(&self, score: f64, key: &Key) -> PushOutcome {
        let listener = &self.listener;
        self.best_list.push_result_with(
            score,
            key.snapshot(),
            key.full_decryption(),
            |entry, rank| listener.on_new_best_entry(entry, rank),
        )
    }

    pub fn log(&self, message: &str, level: LogLevel) {
        self.best_list
            .with_lock(|_| self.listener.on_log(message, level));
    }

    /// Reports progress, at most once per `progress_interval_ms` across all
    /// workers. Calls inside the window are dropped. Also delivers a
    /// throttled new best once its window has passed.
    pub fn progress(
        &self,
        task_id: usize,
        attack_type: AttackType,
        phase: usize,
        counter: usize,
        target: usize,
    ) {
        self.flush_due_notifications();
        let now = self.now_ms();
        if now < self.next_progress_ms.load(Ordering::Relaxed) {
            return;
        }
        self.best_list.with_lock(|_| {
            if now < self.next_progress_ms.load(Ordering::Relaxed) {
                return;
            }
            self.next_progress_ms.store(
                now.saturating_add(self.config.progress_interval_ms),
                Ordering::Relaxed,
            );
            let report = ProgressReport {
                task_id,
                attack_type,
                phase,
                counter,
                target,
                evaluations: self.evaluations(),
                elapsed: Duration::from_millis(
                    now.saturating_sub(self.started_ms.load(Ordering::Relaxed)),
                ),
            };
            self.listener.on_progress(&report);
        });
    }

    pub fn ciphertext_only_attack(&self, ciphertext: &str) -> AttackResult<AttackSummary> {
        if self.config.simulation.enabled {
            return self.simulate_as(Some(AttackType::CiphertextOnly));
        }
        self.run(Target {
            attack_type: AttackType::CiphertextOnly,
            cipher: Arc::from(text_to_symbols(ciphertext)),
            crib: None,
            original: None,
        })
    }

    pub fn known_plaintext_attack(&self, ciphertext: &str, crib: &str) -> AttackResult<AttackSummary> {
        if self.config.simulation.enabled {
            return self.simulate_as(Some(AttackType::KnownPlaintext));
        }
        self.run(Target {
            attack_type: AttackType::KnownPlaintext,
            cipher: Arc::from(text_to_symbols(ciphertext)),
            crib: Some(Arc::from(parse_crib(crib)?)),
            original: None,
        })
    }

    /// Known-plaintext when a crib is given (or configured), ciphertext-only
    /// otherwise. Simulation mode ignores both inputs.
    pub fn attack(&self, ciphertext: &str, crib: Option<&str>) -> AttackResult<AttackSummary> {
        if self.config.simulation.enabled {
            return self.simulate();
        }
        match crib.or(self.config.crib.as_deref()) {
            Some(c) if !c.trim().is_empty() => self.known_plaintext_attack(ciphertext, c),
            _ => self.ciphertext_only_attack(ciphertext),
        }
    }

    /// Attacks a generated message. A non-zero `simulation_crib_length`
    /// selects the known-plaintext attack.
    pub fn simulate(&self) -> AttackResult<AttackSummary> {
        self.simulate_as(None)
    }

    fn simulate_as(&self, forced: Option<AttackType>) -> AttackResult<AttackSummary> {
        self.config.validate()?;
        let mut rng = match self.config.seed {
            Some(s) => fastrand::Rng::with_seed(s.wrapping_add(9999)),
            None => fastrand::Rng::new(),
        };
        let data = simulation::generate(&self.config, &mut rng)?;

        let attack_type = forced.unwrap_or(if data.crib.is_some() {
            AttackType::KnownPlaintext
        } else {
            AttackType::CiphertextOnly
        });
        let crib = match attack_type {
            AttackType::KnownPlaintext => Some(data.crib.ok_or_else(|| {
                AttackError::Setup(
                    "Known-plaintext simulation needs simulation_crib_length > 0".to_string(),
                )
            })?),
            AttackType::CiphertextOnly => None,
        };

        let original_score = match &crib {
            Some(c) => self
                .scorer
                .evaluate(EvalType::Crib, &data.plaintext[..c.len()], Some(c.as_slice())),
            None => self
                .scorer
                .evaluate(self.config.eval_type, &data.plaintext, None),
        };
        self.log(
            &format!("🧪 Original key scores {:.2}", original_score),
            LogLevel::Info,
        );

        self.run(Target {
            attack_type,
            cipher: Arc::from(data.ciphertext),
            crib: crib.map(Arc::from),
            original: Some((Arc::new(data.key), original_score)),
        })
    }

    fn run(&self, target: Target) -> AttackResult<AttackSummary> {
        self.config.validate()?;
        if target.cipher.is_empty() {
            return Err(AttackError::Setup("Ciphertext is empty".to_string()));
        }
        if let Some(crib) = &target.crib {
            if crib.len() > target.cipher.len() {
                return Err(AttackError::Setup(format!(
                    "Crib length {} exceeds ciphertext length {}",
                    crib.len(),
                    target.cipher.len()
                )));
            }
            if crib.iter().all(|c| c.is_none()) {
                return Err(AttackError::Setup("Crib has no known letters".to_string()));
            }
        }

        self.best_list.clear();
        let now = self.now_ms();
        self.started_ms.store(now, Ordering::Relaxed);
        self.next_progress_ms.store(now, Ordering::Relaxed);
        self.eval_baseline
            .store(self.scorer.evaluations(), Ordering::Relaxed);

        let threads = self.config.effective_threads();
        self.log(
            &format!(
                "🚀 {} attack on {} letters: {} machine, {} thread(s)",
                target.attack_type,
                target.cipher.len(),
                self.config.version,
                threads
            ),
            LogLevel::Info,
        );

        let failed_workers = if threads == 1 {
            if let Err(e) = self.run_worker(0, &target) {
                self.flush_notifications();
                self.should_stop.store(false, Ordering::SeqCst);
                return Err(e);
            }
            0
        } else {
            self.run_pool(threads, &target)?
        };

        self.flush_notifications();
        let summary = AttackSummary {
            attack_type: target.attack_type,
            workers: threads,
            evaluations: self.evaluations(),
            elapsed: self.elapsed(),
            entries: self.best_list.get_top(self.best_list.capacity()),
            failed_workers,
            cancelled: self.should_stop(),
            original_key: target.original.as_ref().map(|(k, _)| (**k).clone()),
            original_score: target.original.as_ref().map(|(_, s)| *s),
        };
        // A stop request is consumed by the run it ended, or by the one it
        // was issued ahead of.
        self.should_stop.store(false, Ordering::SeqCst);
        self.log_finish(&summary);
        Ok(summary)
    }

    fn run_pool(&self, threads: usize, target: &Target) -> AttackResult<usize> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("m209-worker-{}", i))
            .build()
            .map_err(|e| AttackError::Setup(format!("Failed to build thread pool: {}", e)))?;

        let finished = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let poll = Duration::from_millis(self.config.poll_interval_ms);

        pool.in_place_scope(|scope| {
            for task_id in 0..threads {
                let finished = &finished;
                let failed = &failed;
                scope.spawn(move |_| {
                    if self.run_worker(task_id, target).is_err() {
                        failed.fetch_add(1, Ordering::SeqCst);
                    }
                    finished.fetch_add(1, Ordering::SeqCst);
                });
            }

            let mut stop_seen = false;
            while finished.load(Ordering::SeqCst) < threads {
                if !stop_seen && self.should_stop() {
                    stop_seen = true;
                    self.log("🛑 Stop requested, waiting for workers", LogLevel::Info);
                }
                self.flush_due_notifications();
                thread::sleep(poll);
            }
        });

        Ok(failed.into_inner())
    }

    /// Worker boundary: errors and panics from the solver become a logged
    /// `WorkerFailure`.
    fn run_worker(&self, task_id: usize, target: &Target) -> AttackResult<()> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.solve(task_id, target)));
        let result = match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(AttackError::WorkerFailure {
                task_id,
                message: e.to_string(),
            }),
            Err(payload) => Err(AttackError::WorkerFailure {
                task_id,
                message: panic_message(payload.as_ref()),
            }),
        };
        if let Err(e) = &result {
            self.log(&format!("❌ {}", e), LogLevel::Error);
        }
        result
    }

    fn solve(&self, task_id: usize, target: &Target) -> AttackResult<()> {
        let mut state = LocalState::new(task_id, self.config.seed);
        let mut key = Key::new(self.config.version);
        key.set_cipher_symbols(target.cipher.clone())?;
        key.set_crib_symbols(target.crib.clone())?;
        if let Some((original, score)) = &target.original {
            key.set_original(original.clone(), *score);
        }
        key.randomize(&mut state.rng);

        match target.attack_type {
            AttackType::CiphertextOnly => ciphertext_only::solve(self, &mut key, &mut state),
            AttackType::KnownPlaintext => known_plaintext::solve(self, &mut key, &mut state),
        }
    }

    fn flush_notifications(&self) {
        let listener = &self.listener;
        self.best_list
            .flush_pending(|entry, rank| listener.on_new_best_entry(entry, rank));
    }

    fn flush_due_notifications(&self) {
        let listener = &self.listener;
        self.best_list
            .flush_if_due(|entry, rank| listener.on_new_best_entry(entry, rank));
    }

    fn log_finish(&self, summary: &AttackSummary) {
        let secs = summary.elapsed.as_secs_f64().max(1e-9);
        let mut message = format!(
            "🏁 {} attack {} after {:.1}s, {} evaluations ({:.0}/s)",
            summary.attack_type,
            if summary.cancelled { "stopped" } else { "finished" },
            secs,
            summary.evaluations,
            summary.evaluations as f64 / secs
        );
        if let Some(best) = summary.best() {
            message.push_str(&format!(", best {:.2}", best.score));
            if let (Some(original), Some(score)) = (&summary.original_key, summary.original_score) {
                message.push_str(&format!(
                    " (original {:.2}, {} wrong pins, {} wrong lugs)",
                    score,
                    best.key.incorrect_pins(original),
                    best.key.incorrect_lugs(original)
                ));
            }
        }
        if summary.failed_workers > 0 {
            message.push_str(&format!(", {} worker(s) failed", summary.failed_workers));
        }
        self.log(&message, LogLevel::Info);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
