use crate::error::{AttackError, AttackResult};
use crate::machine::MachineVersion;
use crate::scorer::{EvalType, Language};
use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything an attack run needs. Fixed once the attack starts.
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    #[arg(long, default_value_t = Language::English)]
    pub language: Language,

    #[arg(long = "machine-version", default_value_t = MachineVersion::Restricted)]
    pub version: MachineVersion,

    /// Worker threads. 0 uses every available core.
    #[arg(long, default_value_t = 1)]
    pub threads: usize,

    /// Search cycles per worker. 0 runs until stopped.
    #[arg(long, default_value_t = 0)]
    pub cycles: usize,

    /// Random trials per cycle for a 1500-letter message; scaled by length.
    #[arg(long, default_value_t = 200)]
    pub phase1_trials: usize,

    /// Scoring function of the ciphertext-only attack.
    #[arg(long, default_value_t = EvalType::Mono)]
    pub eval_type: EvalType,

    /// Directory holding `<language>_1grams.csv` and `<language>_2grams.csv`.
    #[arg(long)]
    pub resource_path: Option<PathBuf>,

    #[arg(short = 'S', long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = 10)]
    pub best_list_size: usize,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub dedup: bool,

    /// Minimum gap between new-best notifications. 0 disables throttling.
    #[arg(long, default_value_t = 250)]
    pub notify_throttle_ms: u64,

    #[arg(long, default_value_t = 1000)]
    pub progress_interval_ms: u64,

    #[arg(long, default_value_t = 100)]
    pub poll_interval_ms: u64,

    /// Known plaintext aligned with the start of the ciphertext.
    #[arg(long)]
    pub crib: Option<String>,

    /// Ciphertext-only: try slide `cycle % 26` each cycle instead of 0.
    #[arg(long, default_value_t = false)]
    pub search_slide: bool,

    #[command(flatten)]
    pub sa: SaParams,

    #[command(flatten)]
    pub simulation: SimulationParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaParams {
    #[arg(long, default_value_t = 60.0)]
    pub temp_max: f64,
    #[arg(long, default_value_t = 2.0)]
    pub temp_min: f64,
    /// Cooling steps per annealing run; every step sweeps all pins.
    #[arg(long, default_value_t = 12)]
    pub sa_sweeps: usize,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Attack a generated message with a known key instead of the input.
    #[arg(long = "simulation", default_value_t = false)]
    pub enabled: bool,
    #[arg(long, default_value_t = 1500)]
    pub simulation_length: usize,
    /// Leading plaintext letters handed over as a crib. 0 runs ciphertext-only.
    #[arg(long, default_value_t = 0)]
    pub simulation_crib_length: usize,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            language: Language::English,
            version: MachineVersion::Restricted,
            threads: 1,
            cycles: 0,
            phase1_trials: 200,
            eval_type: EvalType::Mono,
            resource_path: None,
            seed: None,
            best_list_size: 10,
            dedup: true,
            notify_throttle_ms: 250,
            progress_interval_ms: 1000,
            poll_interval_ms: 100,
            crib: None,
            search_slide: false,
            sa: SaParams::default(),
            simulation: SimulationParams::default(),
        }
    }
}

impl Default for SaParams {
    fn default() -> Self {
        Self {
            temp_max: 60.0,
            temp_min: 2.0,
            sa_sweeps: 12,
        }
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            enabled: false,
            simulation_length: 1500,
            simulation_crib_length: 0,
        }
    }
}

impl AttackConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> AttackResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AttackError::Setup(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Overwrites fields with values the user typed on the command line,
    /// leaving file values in place where the CLI only has defaults.
    pub fn merge_from_cli(&mut self, cli: &AttackConfig, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($($field:ident).+, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$($field).+ = cli.$($field).+.clone();
                }
            };
        }

        update_if_present!(language, "language");
        update_if_present!(version, "version");
        update_if_present!(threads, "threads");
        update_if_present!(cycles, "cycles");
        update_if_present!(phase1_trials, "phase1_trials");
        update_if_present!(eval_type, "eval_type");
        update_if_present!(resource_path, "resource_path");
        update_if_present!(seed, "seed");
        update_if_present!(best_list_size, "best_list_size");
        update_if_present!(dedup, "dedup");
        update_if_present!(notify_throttle_ms, "notify_throttle_ms");
        update_if_present!(progress_interval_ms, "progress_interval_ms");
        update_if_present!(poll_interval_ms, "poll_interval_ms");
        update_if_present!(crib, "crib");
        update_if_present!(search_slide, "search_slide");
        update_if_present!(sa.temp_max, "temp_max");
        update_if_present!(sa.temp_min, "temp_min");
        update_if_present!(sa.sa_sweeps, "sa_sweeps");
        update_if_present!(simulation.enabled, "enabled");
        update_if_present!(simulation.simulation_length, "simulation_length");
        update_if_present!(simulation.simulation_crib_length, "simulation_crib_length");
    }

    pub fn validate(&self) -> AttackResult<()> {
        if self.phase1_trials == 0 {
            return Err(AttackError::Setup("phase1_trials must be at least 1".into()));
        }
        if self.best_list_size == 0 {
            return Err(AttackError::Setup("best_list_size must be at least 1".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(AttackError::Setup("poll_interval_ms must be at least 1".into()));
        }
        if !(self.sa.temp_min > 0.0 && self.sa.temp_max >= self.sa.temp_min) {
            return Err(AttackError::Setup(format!(
                "Invalid temperature range {}..{}",
                self.sa.temp_min, self.sa.temp_max
            )));
        }
        if self.sa.sa_sweeps == 0 {
            return Err(AttackError::Setup("sa_sweeps must be at least 1".into()));
        }
        if self.simulation.enabled {
            if self.simulation.simulation_length == 0 {
                return Err(AttackError::Setup(
                    "simulation_length must be at least 1".into(),
                ));
            }
            if self.simulation.simulation_crib_length > self.simulation.simulation_length {
                return Err(AttackError::Setup(
                    "simulation_crib_length exceeds simulation_length".into(),
                ));
            }
        }
        Ok(())
    }

    /// Thread count with 0 resolved to the machine's parallelism.
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.threads
        }
    }

    /// Cycle budget with 0 meaning no limit.
    pub fn effective_cycles(&self) -> usize {
        if self.cycles == 0 {
            usize::MAX
        } else {
            self.cycles
        }
    }
}
