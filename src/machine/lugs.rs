use super::version::{MachineVersion, OverlapRules};
use crate::consts::{ALPHABET_SIZE, BARS, ENGAGEMENT_VECTORS, TYPE_COUNT_SIZE, WHEELS};
use crate::error::{AttackError, AttackResult};
use fastrand::Rng;

pub type TypeCount = [u8; TYPE_COUNT_SIZE];

/// Wheels (1-based, 0 = no lug) covered by each type-count slot.
pub const TYPE_WHEELS: [(usize, usize); TYPE_COUNT_SIZE] = [
    (0, 0),
    (0, 1),
    (0, 2),
    (0, 3),
    (0, 4),
    (0, 5),
    (0, 6),
    (1, 2),
    (1, 3),
    (1, 4),
    (1, 5),
    (1, 6),
    (2, 3),
    (2, 4),
    (2, 5),
    (2, 6),
    (3, 4),
    (3, 5),
    (3, 6),
    (4, 5),
    (4, 6),
    (5, 6),
];

const INDICES: [[usize; WHEELS + 1]; WHEELS + 1] = [
    [0, 1, 2, 3, 4, 5, 6],
    [1, 0, 7, 8, 9, 10, 11],
    [2, 7, 0, 12, 13, 14, 15],
    [3, 8, 12, 0, 16, 17, 18],
    [4, 9, 13, 16, 0, 19, 20],
    [5, 10, 14, 17, 19, 0, 21],
    [6, 11, 15, 18, 20, 21, 0],
];

/// Slot for a bar with lugs against wheels `w1` and `w2` (1-based, 0 = none).
#[inline(always)]
pub fn type_index(w1: usize, w2: usize) -> usize {
    INDICES[w1][w2]
}

pub fn overlaps(type_count: &TypeCount) -> usize {
    type_count[7..].iter().map(|&c| c as usize).sum()
}

pub fn bar_total(type_count: &TypeCount) -> usize {
    type_count.iter().map(|&c| c as usize).sum()
}

/// Lug settings, kept as a count per bar type since bar order does not
/// affect the displacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lugs {
    version: MachineVersion,
    type_count: TypeCount,
    displacement: [u8; ENGAGEMENT_VECTORS],
}

impl Lugs {
    /// Empty cage. Only meaningful as a placeholder until randomized or set.
    pub fn new(version: MachineVersion) -> Self {
        Self {
            version,
            type_count: [0; TYPE_COUNT_SIZE],
            displacement: [0; ENGAGEMENT_VECTORS],
        }
    }

    pub fn random(version: MachineVersion, rng: &mut Rng) -> Self {
        let mut lugs = Self::new(version);
        lugs.randomize(rng);
        lugs
    }

    /// Parses a lug string such as `"1-2 1-4 0-3 0-3 ..."`.
    pub fn parse(version: MachineVersion, lugs: &str) -> AttackResult<Self> {
        let rules = version.rules();
        let mut type_count = [0u8; TYPE_COUNT_SIZE];
        let bars: Vec<&str> = lugs.split_whitespace().collect();

        if bars.len() > BARS || (bars.len() < BARS && !rules.allow_empty_bars) {
            return Err(AttackError::Setup(format!(
                "Lug string has {} bars, machine has {}",
                bars.len(),
                BARS
            )));
        }

        for bar in bars {
            let (a, b) = bar
                .split_once('-')
                .ok_or_else(|| AttackError::Setup(format!("Malformed bar '{}'", bar)))?;
            let w1: usize = a
                .trim()
                .parse()
                .map_err(|_| AttackError::Setup(format!("Malformed bar '{}'", bar)))?;
            let w2: usize = b
                .trim()
                .parse()
                .map_err(|_| AttackError::Setup(format!("Malformed bar '{}'", bar)))?;

            if w1 > WHEELS || w2 > WHEELS {
                return Err(AttackError::Setup(format!(
                    "Bar '{}' references a wheel beyond {}",
                    bar, WHEELS
                )));
            }
            if w1 == w2 && w1 != 0 {
                return Err(AttackError::Setup(format!(
                    "Bar '{}' has both lugs on the same wheel",
                    bar
                )));
            }
            let (lo, hi) = if w1 <= w2 { (w1, w2) } else { (w2, w1) };
            if hi == 0 && !rules.allow_empty_bars {
                return Err(AttackError::Setup(format!(
                    "Empty bar '{}' not allowed for {} machines",
                    bar, version
                )));
            }
            type_count[type_index(lo, hi)] += 1;
        }

        let mut parsed = Self::new(version);
        if !parsed.set_type_count(&type_count) {
            return Err(AttackError::Setup(format!(
                "Lug settings violate the {} overlap rules: {}",
                version, lugs
            )));
        }
        Ok(parsed)
    }

    pub fn version(&self) -> MachineVersion {
        self.version
    }

    pub fn type_count(&self) -> &TypeCount {
        &self.type_count
    }

    #[inline(always)]
    pub fn displacement(&self, vector: usize) -> u8 {
        self.displacement[vector]
    }

    /// Applies `type_count` if the version accepts it; the current settings
    /// are left untouched otherwise.
    pub fn set_type_count(&mut self, type_count: &TypeCount) -> bool {
        if !is_compliant(type_count, &self.version.rules()) {
            return false;
        }
        self.type_count = *type_count;
        self.compute_displacement();
        true
    }

    pub fn randomize(&mut self, rng: &mut Rng) {
        let rules = self.version.rules();
        let mut type_count;
        loop {
            type_count = [0u8; TYPE_COUNT_SIZE];
            match self.version {
                MachineVersion::Unrestricted => {
                    for _ in 0..BARS {
                        let w1 = rng.usize(0..=WHEELS);
                        let w2 = rng.usize(0..=WHEELS);
                        if w1 == 0 {
                            type_count[0] += 1;
                        } else if w2 == 0 || w1 == w2 {
                            type_count[type_index(0, w1)] += 1;
                        } else {
                            type_count[type_index(w1.min(w2), w1.max(w2))] += 1;
                        }
                    }
                }
                MachineVersion::NoOverlap => {
                    for _ in 0..BARS {
                        type_count[type_index(0, rng.usize(1..=WHEELS))] += 1;
                    }
                }
                MachineVersion::Swedish => {
                    for _ in 0..BARS {
                        let w1 = rng.usize(1..=WHEELS);
                        let w2 = rng.usize(0..=WHEELS);
                        if w2 == 0 || w1 == w2 || overlaps(&type_count) >= rules.max_overlap {
                            type_count[type_index(0, w1)] += 1;
                        } else {
                            type_count[type_index(w1.min(w2), w1.max(w2))] += 1;
                        }
                    }
                }
                MachineVersion::Restricted => {
                    let wanted = rng.usize(rules.min_overlap..=rules.max_overlap);
                    let mut placed = 0;
                    let mut attempts = 0;
                    while placed < wanted && attempts < 1000 {
                        attempts += 1;
                        let w1 = rng.usize(1..=WHEELS);
                        let w2 = rng.usize(1..=WHEELS);
                        if w1 == w2 {
                            continue;
                        }
                        let idx = type_index(w1.min(w2), w1.max(w2));
                        if type_count[idx] as usize >= rules.max_same_overlap {
                            continue;
                        }
                        type_count[idx] += 1;
                        placed += 1;
                    }
                    for _ in placed..BARS {
                        type_count[type_index(0, rng.usize(1..=WHEELS))] += 1;
                    }
                }
            }
            if is_compliant(&type_count, &rules) {
                break;
            }
        }
        self.type_count = type_count;
        self.compute_displacement();
    }

    /// Number of bars that would have to move to turn these settings into `other`.
    pub fn incorrect_lugs(&self, other: &Lugs) -> usize {
        let diff: usize = self
            .type_count
            .iter()
            .zip(other.type_count.iter())
            .map(|(&a, &b)| (a as i32 - b as i32).unsigned_abs() as usize)
            .sum();
        diff / 2
    }

    pub fn to_lug_string(&self) -> String {
        let mut bars = Vec::with_capacity(BARS);
        for slot in (7..TYPE_COUNT_SIZE).chain(1..7) {
            let (w1, w2) = TYPE_WHEELS[slot];
            for _ in 0..self.type_count[slot] {
                bars.push(format!("{}-{}", w1, w2));
            }
        }
        for _ in 0..self.type_count[0] {
            bars.push("0-0".to_string());
        }
        bars.join(" ")
    }

    fn compute_displacement(&mut self) {
        for v in 0..ENGAGEMENT_VECTORS {
            let mut displacement = 0usize;
            for slot in 1..TYPE_COUNT_SIZE {
                let count = self.type_count[slot] as usize;
                if count == 0 {
                    continue;
                }
                let (w1, w2) = TYPE_WHEELS[slot];
                let active_1 = w1 != 0 && (v >> (w1 - 1)) & 1 == 1;
                let active_2 = (v >> (w2 - 1)) & 1 == 1;
                if active_1 || active_2 {
                    displacement += count;
                }
            }
            self.displacement[v] = (displacement % ALPHABET_SIZE) as u8;
        }
    }
}

fn is_compliant(type_count: &TypeCount, rules: &OverlapRules) -> bool {
    let total = bar_total(type_count);
    if total > BARS || (total < BARS && !rules.allow_empty_bars) {
        return false;
    }
    if type_count[0] > 0 && !rules.allow_empty_bars {
        return false;
    }

    let ov = overlaps(type_count);
    if ov < rules.min_overlap || ov > rules.max_overlap {
        return false;
    }
    if type_count[7..]
        .iter()
        .any(|&c| c as usize > rules.max_same_overlap)
    {
        return false;
    }

    if rules.every_wheel_used {
        for w in 1..=WHEELS {
            let used = (1..TYPE_COUNT_SIZE).any(|slot| {
                let (w1, w2) = TYPE_WHEELS[slot];
                type_count[slot] > 0 && (w1 == w || w2 == w)
            });
            if !used {
                return false;
            }
        }
    }
    true
}
