use crate::consts::{WHEELS, WHEEL_LETTERS, WHEEL_SIZES};
use crate::error::{AttackError, AttackResult};
use fastrand::Rng;

/// Pin settings of the six wheels, indexed by position relative to the
/// start of the message (wheel `w`, position `pos % WHEEL_SIZES[w]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pins {
    wheels: [Vec<bool>; WHEELS],
}

impl Default for Pins {
    fn default() -> Self {
        Self::new()
    }
}

impl Pins {
    /// All pins inactive.
    pub fn new() -> Self {
        Self {
            wheels: std::array::from_fn(|w| vec![false; WHEEL_SIZES[w]]),
        }
    }

    pub fn random(rng: &mut Rng) -> Self {
        let mut pins = Self::new();
        pins.randomize(rng);
        pins
    }

    pub fn randomize(&mut self, rng: &mut Rng) {
        for wheel in self.wheels.iter_mut() {
            for pin in wheel.iter_mut() {
                *pin = rng.bool();
            }
        }
    }

    /// Parses one `0`/`1` string per wheel, wheel 1 first.
    pub fn from_bit_strings(wheels: &[&str]) -> AttackResult<Self> {
        if wheels.len() != WHEELS {
            return Err(AttackError::Input(format!(
                "Expected {} pin wheels, got {}",
                WHEELS,
                wheels.len()
            )));
        }
        let mut pins = Self::new();
        for (w, s) in wheels.iter().enumerate() {
            let s = s.trim();
            if s.len() != WHEEL_SIZES[w] {
                return Err(AttackError::Input(format!(
                    "Wheel {} needs {} pins, got '{}'",
                    w + 1,
                    WHEEL_SIZES[w],
                    s
                )));
            }
            for (p, c) in s.chars().enumerate() {
                pins.wheels[w][p] = match c {
                    '1' => true,
                    '0' => false,
                    other => {
                        return Err(AttackError::Input(format!(
                            "Invalid pin '{}' on wheel {}",
                            other,
                            w + 1
                        )))
                    }
                };
            }
        }
        Ok(pins)
    }

    #[inline(always)]
    pub fn get(&self, w: usize, p: usize) -> bool {
        self.wheels[w][p]
    }

    #[inline(always)]
    pub fn toggle(&mut self, w: usize, p: usize) {
        self.wheels[w][p] ^= true;
    }

    pub fn copy_from(&mut self, other: &Pins) {
        for (dst, src) in self.wheels.iter_mut().zip(other.wheels.iter()) {
            dst.copy_from_slice(src);
        }
    }

    /// Engagement vector at `pos`: bit `w` set when wheel `w` has an active pin.
    #[inline(always)]
    pub fn engagement(&self, pos: usize) -> usize {
        let mut v = 0;
        for w in 0..WHEELS {
            if self.wheels[w][pos % WHEEL_SIZES[w]] {
                v |= 1 << w;
            }
        }
        v
    }

    /// Pins that differ from `other`. A wheel with every pin inverted is
    /// equivalent up to the lug settings, so each wheel counts the smaller
    /// of the two readings.
    pub fn incorrect_pins(&self, other: &Pins) -> usize {
        (0..WHEELS)
            .map(|w| {
                let diff = self.wheels[w]
                    .iter()
                    .zip(other.wheels[w].iter())
                    .filter(|(a, b)| a != b)
                    .count();
                diff.min(WHEEL_SIZES[w] - diff)
            })
            .sum()
    }

    pub fn to_bit_strings(&self) -> Vec<String> {
        self.wheels
            .iter()
            .map(|wheel| wheel.iter().map(|&p| if p { '1' } else { '0' }).collect())
            .collect()
    }

    /// Active pins as wheel letters, e.g. `ACDF...`.
    pub fn to_letter_strings(&self) -> Vec<String> {
        self.wheels
            .iter()
            .enumerate()
            .map(|(w, wheel)| {
                WHEEL_LETTERS[w]
                    .chars()
                    .zip(wheel.iter())
                    .filter(|(_, &active)| active)
                    .map(|(c, _)| c)
                    .collect()
            })
            .collect()
    }
}
