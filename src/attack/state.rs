use crate::machine::{Key, Pins, TypeCount};
use fastrand::Rng;

/// Scratch state owned by one worker. Never shared between threads.
pub struct LocalState {
    pub task_id: usize,
    pub rng: Rng,
    pub current_cycle: usize,
    /// Best score of the current cycle.
    pub best_score: f64,
    best_type_count: Option<TypeCount>,
    best_pins: Pins,
}

impl LocalState {
    /// Workers with the same seed get distinct but reproducible streams.
    pub fn new(task_id: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => Rng::with_seed(s.wrapping_add(task_id as u64)),
            None => Rng::new(),
        };
        Self {
            task_id,
            rng,
            current_cycle: 0,
            best_score: f64::NEG_INFINITY,
            best_type_count: None,
            best_pins: Pins::new(),
        }
    }

    pub fn start_cycle(&mut self, cycle: usize) {
        self.current_cycle = cycle;
        self.best_score = f64::NEG_INFINITY;
        self.best_type_count = None;
    }

    /// Records `key` as the best of the cycle if `score` beats it.
    pub fn offer(&mut self, key: &Key, score: f64) -> bool {
        if score > self.best_score {
            self.best_score = score;
            self.remember(key);
            true
        } else {
            false
        }
    }

    pub fn remember(&mut self, key: &Key) {
        self.best_type_count = Some(*key.type_count());
        self.best_pins.copy_from(key.pins());
    }

    /// Puts the remembered settings back into `key`. No-op before the first
    /// `remember`.
    pub fn restore(&self, key: &mut Key) {
        if let Some(tc) = &self.best_type_count {
            key.set_type_count(tc);
            key.set_pins(&self.best_pins);
        }
    }
}
