use crate::reports;
use clap::Args;
use m209_analyzer::attack::AttackManager;
use m209_analyzer::config::AttackConfig;
use m209_analyzer::error::AttackResult;

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub config: AttackConfig,

    /// Stop after this many seconds.
    #[arg(short = 'T', long)]
    pub time: Option<u64>,
}

pub fn run(args: SimulateArgs, mut config: AttackConfig, json: bool) -> AttackResult<()> {
    config.simulation.enabled = true;
    let manager = AttackManager::new(config)?;
    super::spawn_deadline(manager.stop_handle(), args.time);

    let summary = manager.simulate()?;
    reports::print_summary(&summary, json)
}
