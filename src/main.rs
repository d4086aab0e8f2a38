use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use m209_analyzer::config::AttackConfig;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON attack configuration; flags given on the command line win.
    #[arg(global = true, long)]
    config: Option<PathBuf>,

    /// Print the result as JSON instead of tables.
    #[arg(global = true, long, default_value_t = false)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recover the key of a ciphertext, with an optional crib.
    Attack(cmd::attack::AttackArgs),
    /// Attack a generated message whose key is known.
    Simulate(cmd::simulate::SimulateArgs),
}

fn main() {
    // Logs go to stderr so `--json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let (cli_config, sub_name) = match &cli.command {
        Commands::Attack(args) => (&args.config, "attack"),
        Commands::Simulate(args) => (&args.config, "simulate"),
    };
    let sub_matches = matches.subcommand_matches(sub_name).unwrap_or(&matches);

    let config = match &cli.config {
        Some(path) => {
            info!("📂 Loading config from: {}", path.display());
            let mut file_config = AttackConfig::load_from_file(path).unwrap_or_else(|e| {
                error!("❌ {}", e);
                process::exit(1);
            });
            file_config.merge_from_cli(cli_config, sub_matches);
            file_config
        }
        None => cli_config.clone(),
    };

    let result = match cli.command {
        Commands::Attack(args) => cmd::attack::run(args, config, cli.json),
        Commands::Simulate(args) => cmd::simulate::run(args, config, cli.json),
    };

    if let Err(e) = result {
        error!("❌ {}", e);
        process::exit(1);
    }
}
