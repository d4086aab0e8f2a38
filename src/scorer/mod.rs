pub mod builtin;
pub mod loader;

use crate::consts::ALPHABET_SIZE;
use crate::error::{AttackError, AttackResult};
use loader::RawGrams;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use strum_macros::{Display, EnumIter, EnumString};
use tracing::info;

/// Scores are per-symbol means scaled by this factor so that the different
/// measures land in comparable ranges.
pub const SCORE_SCALE: f64 = 1000.0;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    EnumString,
    Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EvalType {
    /// Monogram log-likelihood.
    #[default]
    Mono,
    /// Bigram log-likelihood.
    Bigram,
    /// Closeness of the decryption to the known plaintext.
    Crib,
    /// Index of coincidence.
    Ic,
    /// Shannon entropy, lower is better.
    Entropy,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    EnumString,
    Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    English,
    German,
}

/// Log-likelihood tables for one language. Read-only once built.
#[derive(Debug, Clone)]
pub struct LanguageStats {
    pub language: Language,
    mono: [f64; ALPHABET_SIZE],
    bigram: Vec<f64>,
}

impl LanguageStats {
    pub fn from_raw(language: Language, raw: &RawGrams) -> AttackResult<Self> {
        let mono_weights = log_weights(&raw.mono).ok_or_else(|| {
            AttackError::Setup(format!("Monogram table for {} is empty", language))
        })?;
        let bigram = log_weights(&raw.bigram).ok_or_else(|| {
            AttackError::Setup(format!("Bigram table for {} is empty", language))
        })?;

        let mut mono = [0.0; ALPHABET_SIZE];
        mono.copy_from_slice(&mono_weights);
        Ok(Self {
            language,
            mono,
            bigram,
        })
    }

    /// Tables from `resource_path` when given, the built-in English tables
    /// otherwise.
    pub fn load(language: Language, resource_path: Option<&Path>) -> AttackResult<Self> {
        match resource_path {
            Some(root) => {
                let raw = loader::load_language(root, language)?;
                Self::from_raw(language, &raw)
            }
            None => match language {
                Language::English => {
                    info!("📚 Using built-in English statistics");
                    Self::from_raw(language, &builtin::english())
                }
                other => Err(AttackError::Setup(format!(
                    "No built-in statistics for {}; set a resource path",
                    other
                ))),
            },
        }
    }

    #[inline(always)]
    pub fn mono(&self, s: u8) -> f64 {
        self.mono[s as usize]
    }

    #[inline(always)]
    pub fn bigram(&self, a: u8, b: u8) -> f64 {
        self.bigram[a as usize * ALPHABET_SIZE + b as usize]
    }
}

/// `ln(p * cells)` per cell, so uniform noise scores around zero and real
/// text above it. Empty cells get a tenth of the smallest observed count.
fn log_weights(counts: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let floor = counts
        .iter()
        .copied()
        .filter(|&c| c > 0.0)
        .fold(f64::MAX, f64::min)
        / 10.0;
    let cells = counts.len() as f64;
    Some(
        counts
            .iter()
            .map(|&c| (c.max(floor) / total * cells).ln())
            .collect(),
    )
}

/// The scoring oracle. Shared between workers behind an `Arc`; the only
/// mutable state is the evaluation counter.
#[derive(Debug)]
pub struct Scorer {
    stats: LanguageStats,
    evaluations: AtomicU64,
}

impl Scorer {
    pub fn new(stats: LanguageStats) -> Self {
        Self {
            stats,
            evaluations: AtomicU64::new(0),
        }
    }

    pub fn load(language: Language, resource_path: Option<&Path>) -> AttackResult<Self> {
        Ok(Self::new(LanguageStats::load(language, resource_path)?))
    }

    pub fn stats(&self) -> &LanguageStats {
        &self.stats
    }

    pub fn language(&self) -> Language {
        self.stats.language
    }

    /// Total evaluations since construction, across all threads.
    pub fn evaluations(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Scores a candidate decryption; higher means more plausible.
    pub fn evaluate(&self, eval_type: EvalType, decryption: &[u8], crib: Option<&[Option<u8>]>) -> f64 {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        match eval_type {
            EvalType::Mono => self.mono_score(decryption),
            EvalType::Bigram => self.bigram_score(decryption),
            EvalType::Crib => match crib {
                Some(c) => crib_score(decryption, c),
                None => 0.0,
            },
            EvalType::Ic => ic_score(decryption),
            EvalType::Entropy => entropy_score(decryption),
        }
    }

    fn mono_score(&self, decryption: &[u8]) -> f64 {
        if decryption.is_empty() {
            return 0.0;
        }
        let sum: f64 = decryption.iter().map(|&s| self.stats.mono(s)).sum();
        sum / decryption.len() as f64 * SCORE_SCALE
    }

    fn bigram_score(&self, decryption: &[u8]) -> f64 {
        if decryption.len() < 2 {
            return 0.0;
        }
        let sum: f64 = decryption
            .windows(2)
            .map(|w| self.stats.bigram(w[0], w[1]))
            .sum();
        sum / (decryption.len() - 1) as f64 * SCORE_SCALE
    }
}

/// Mean closeness over the known crib positions; each letter contributes
/// `1 - d / 13` where `d` is the circular distance to the expected letter.
pub fn crib_score(decryption: &[u8], crib: &[Option<u8>]) -> f64 {
    let half = (ALPHABET_SIZE / 2) as f64;
    let mut known = 0usize;
    let mut sum = 0.0;
    for (&d, c) in decryption.iter().zip(crib.iter()) {
        if let Some(c) = *c {
            let diff = (d as i32 - c as i32).unsigned_abs() as usize;
            let dist = diff.min(ALPHABET_SIZE - diff) as f64;
            sum += 1.0 - dist / half;
            known += 1;
        }
    }
    if known == 0 {
        return 0.0;
    }
    sum / known as f64 * SCORE_SCALE
}

fn histogram(decryption: &[u8]) -> [usize; ALPHABET_SIZE] {
    let mut counts = [0usize; ALPHABET_SIZE];
    for &s in decryption {
        counts[s as usize] += 1;
    }
    counts
}

pub fn ic_score(decryption: &[u8]) -> f64 {
    let n = decryption.len();
    if n < 2 {
        return 0.0;
    }
    let coincidences: usize = histogram(decryption).iter().map(|&c| c * c.saturating_sub(1)).sum();
    coincidences as f64 / (n * (n - 1)) as f64 * ALPHABET_SIZE as f64 * SCORE_SCALE
}

pub fn entropy_score(decryption: &[u8]) -> f64 {
    let n = decryption.len();
    if n == 0 {
        return 0.0;
    }
    let entropy: f64 = histogram(decryption)
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n as f64;
            -p * p.ln()
        })
        .sum();
    let max = (ALPHABET_SIZE as f64).ln();
    (max - entropy) / max * SCORE_SCALE
}
