/// Number of pin wheels on the machine.
pub const WHEELS: usize = 6;

/// Pin count of each wheel, wheel 1 first.
pub const WHEEL_SIZES: [usize; WHEELS] = [26, 25, 23, 21, 19, 17];

/// Letters engraved on each wheel, used when rendering absolute pin settings.
pub const WHEEL_LETTERS: [&str; WHEELS] = [
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "ABCDEFGHIJKLMNOPQRSTUVXYZ",
    "ABCDEFGHIJKLMNOPQRSTUVX",
    "ABCDEFGHIJKLMNOPQRSTU",
    "ABCDEFGHIJKLMNOPQRS",
    "ABCDEFGHIJKLMNOPQ",
];

/// Number of bars in the cage.
pub const BARS: usize = 27;

/// Slot 0 is the empty bar, 1..=6 single lugs, 7..=21 overlapping pairs.
pub const TYPE_COUNT_SIZE: usize = 22;

/// Every wheel can be active or not: 2^6 engagement vectors.
pub const ENGAGEMENT_VECTORS: usize = 64;

pub const ALPHABET_SIZE: usize = 26;

/// Type-count slots that hold bars, in the order the hill climber walks them.
pub const LUG_TYPES: [usize; 21] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21,
];

/// Ciphertext length the phase-1 trial count is calibrated against.
pub const PHASE1_REFERENCE_LENGTH: usize = 1500;
