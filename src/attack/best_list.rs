use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// One kept candidate: its score, the key that produced it and the
/// decryption as symbol indices.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry<K> {
    pub score: f64,
    pub key: K,
    pub decryption: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// New entry at `rank` (0 = best).
    Inserted { rank: usize, notified: bool },
    /// An entry with the same decryption was beaten and moved to `rank`.
    Replaced { rank: usize, notified: bool },
    /// Same decryption already kept with an equal or better score.
    Duplicate,
    /// Not good enough for a full list, or not a number.
    Rejected,
}

impl PushOutcome {
    pub fn accepted(&self) -> bool {
        matches!(
            self,
            PushOutcome::Inserted { .. } | PushOutcome::Replaced { .. }
        )
    }
}

#[derive(Debug)]
struct Inner<K> {
    entries: Vec<ResultEntry<K>>,
    last_notify: Option<Instant>,
    pending: bool,
}

/// Bounded, score-ordered list of the best candidates seen by all workers.
///
/// All mutation happens under one mutex. Notification callbacks run while
/// the lock is held so listeners observe entries in the order the list
/// changed.
#[derive(Debug)]
pub struct BestList<K> {
    capacity: usize,
    dedup: bool,
    throttle: Option<Duration>,
    inner: Mutex<Inner<K>>,
}

impl<K: Clone> BestList<K> {
    pub fn new(capacity: usize, dedup: bool, throttle: Option<Duration>) -> Self {
        Self {
            capacity: capacity.max(1),
            dedup,
            throttle: throttle.filter(|d| !d.is_zero()),
            inner: Mutex::new(Inner {
                entries: Vec::with_capacity(capacity.max(1) + 1),
                last_notify: None,
                pending: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K>> {
        // A panicking worker must not take the list down with it.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push_result(&self, score: f64, key: K, decryption: Vec<u8>) -> PushOutcome {
        self.push_result_with(score, key, decryption, |_, _| {})
    }

    /// Inserts the candidate if it qualifies. `notify` receives the new entry
    /// and its rank, unless the throttle window suppresses it.
    pub fn push_result_with<F>(
        &self,
        score: f64,
        key: K,
        decryption: Vec<u8>,
        notify: F,
    ) -> PushOutcome
    where
        F: FnOnce(&ResultEntry<K>, usize),
    {
        if score.is_nan() {
            return PushOutcome::Rejected;
        }

        let mut inner = self.lock();
        let mut replaced = false;

        if self.dedup {
            if let Some(idx) = inner
                .entries
                .iter()
                .position(|e| e.decryption == decryption)
            {
                if score <= inner.entries[idx].score {
                    return PushOutcome::Duplicate;
                }
                inner.entries.remove(idx);
                replaced = true;
            }
        }

        if !replaced && inner.entries.len() >= self.capacity {
            if let Some(worst) = inner.entries.last() {
                if score <= worst.score {
                    return PushOutcome::Rejected;
                }
            }
        }

        // Equal scores keep the earlier entry ahead.
        let rank = inner.entries.partition_point(|e| e.score >= score);
        inner.entries.insert(
            rank,
            ResultEntry {
                score,
                key,
                decryption,
            },
        );
        inner.entries.truncate(self.capacity);

        let notified = self.try_notify(&mut inner, rank, notify);
        if replaced {
            PushOutcome::Replaced { rank, notified }
        } else {
            PushOutcome::Inserted { rank, notified }
        }
    }

    /// Only rank-0 notifications open a throttle window. A rank-0 change that
    /// falls inside the window is remembered as pending.
    fn try_notify<F>(&self, inner: &mut Inner<K>, rank: usize, notify: F) -> bool
    where
        F: FnOnce(&ResultEntry<K>, usize),
    {
        let now = Instant::now();
        if self.in_window(inner, now) {
            if rank == 0 {
                inner.pending = true;
            }
            return false;
        }
        if rank == 0 {
            inner.last_notify = Some(now);
            inner.pending = false;
        }
        notify(&inner.entries[rank], rank);
        true
    }

    fn in_window(&self, inner: &Inner<K>, now: Instant) -> bool {
        match (self.throttle, inner.last_notify) {
            (Some(window), Some(last)) => now.duration_since(last) < window,
            _ => false,
        }
    }

    /// Delivers the current best entry if a notification was swallowed by
    /// the throttle. Returns whether `notify` ran.
    pub fn flush_pending<F>(&self, notify: F) -> bool
    where
        F: FnOnce(&ResultEntry<K>, usize),
    {
        let mut inner = self.lock();
        Self::deliver_pending(&mut inner, notify)
    }

    /// Like [`flush_pending`](Self::flush_pending), but only once the
    /// throttle window of the last delivered best has passed.
    pub fn flush_if_due<F>(&self, notify: F) -> bool
    where
        F: FnOnce(&ResultEntry<K>, usize),
    {
        let mut inner = self.lock();
        if !inner.pending || self.in_window(&inner, Instant::now()) {
            return false;
        }
        Self::deliver_pending(&mut inner, notify)
    }

    fn deliver_pending<F>(inner: &mut Inner<K>, notify: F) -> bool
    where
        F: FnOnce(&ResultEntry<K>, usize),
    {
        if !inner.pending {
            return false;
        }
        inner.pending = false;
        inner.last_notify = Some(Instant::now());
        match inner.entries.first() {
            Some(best) => {
                notify(best, 0);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the best `n` entries, best first.
    pub fn get_top(&self, n: usize) -> Vec<ResultEntry<K>> {
        let inner = self.lock();
        inner.entries.iter().take(n).cloned().collect()
    }

    pub fn best_score(&self) -> Option<f64> {
        self.lock().entries.first().map(|e| e.score)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.last_notify = None;
        inner.pending = false;
    }

    /// Runs `f` under the list lock with a read-only view of the entries.
    pub fn with_lock<R>(&self, f: impl FnOnce(&[ResultEntry<K>]) -> R) -> R {
        let inner = self.lock();
        f(&inner.entries)
    }
}
