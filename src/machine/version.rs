use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Lug-setting regimes the attack can assume for the target machine.
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
pub enum MachineVersion {
    /// Settings that follow the operator manual: every bar used, a bounded
    /// number of overlaps, and no pair repeated too often.
    #[default]
    Restricted,
    /// Any lug placement, empty bars allowed.
    Unrestricted,
    /// One lug per bar.
    NoOverlap,
    /// Every bar used, overlaps capped, no further rules.
    Swedish,
}

/// Limits a lug type-count vector must satisfy for a given version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapRules {
    pub min_overlap: usize,
    pub max_overlap: usize,
    pub max_same_overlap: usize,
    pub allow_empty_bars: bool,
    pub every_wheel_used: bool,
}

impl MachineVersion {
    pub fn rules(self) -> OverlapRules {
        match self {
            MachineVersion::Restricted => OverlapRules {
                min_overlap: 1,
                max_overlap: 12,
                max_same_overlap: 4,
                allow_empty_bars: false,
                every_wheel_used: true,
            },
            MachineVersion::Unrestricted => OverlapRules {
                min_overlap: 0,
                max_overlap: crate::consts::BARS,
                max_same_overlap: crate::consts::BARS,
                allow_empty_bars: true,
                every_wheel_used: false,
            },
            MachineVersion::NoOverlap => OverlapRules {
                min_overlap: 0,
                max_overlap: 0,
                max_same_overlap: 0,
                allow_empty_bars: false,
                every_wheel_used: false,
            },
            MachineVersion::Swedish => OverlapRules {
                min_overlap: 0,
                max_overlap: 14,
                max_same_overlap: crate::consts::BARS,
                allow_empty_bars: false,
                every_wheel_used: false,
            },
        }
    }
}
