use crate::reports;
use clap::Args;
use m209_analyzer::attack::AttackManager;
use m209_analyzer::config::AttackConfig;
use m209_analyzer::error::{AttackError, AttackResult};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct AttackArgs {
    #[command(flatten)]
    pub config: AttackConfig,

    #[arg(short = 'c', long, conflicts_with = "ciphertext_file")]
    pub ciphertext: Option<String>,

    #[arg(long)]
    pub ciphertext_file: Option<PathBuf>,

    /// Stop after this many seconds.
    #[arg(short = 'T', long)]
    pub time: Option<u64>,
}

pub fn run(args: AttackArgs, config: AttackConfig, json: bool) -> AttackResult<()> {
    let ciphertext = match (&args.ciphertext, &args.ciphertext_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => {
            info!("📂 Reading ciphertext from: {}", path.display());
            fs::read_to_string(path)?
        }
        (None, None) if config.simulation.enabled => String::new(),
        (None, None) => {
            return Err(AttackError::Setup(
                "Provide --ciphertext or --ciphertext-file".to_string(),
            ))
        }
    };

    let manager = AttackManager::new(config)?;
    super::spawn_deadline(manager.stop_handle(), args.time);

    let summary = manager.attack(&ciphertext, None)?;
    reports::print_summary(&summary, json)
}
