//! `sensor-logger` - runs a logging session against a simulated or replayed
//! device, and checks configs and finished log files.

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_inspect, run_session, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "sensor-logger starting");

    let result = match &cli.command {
        Commands::Run(args) => run_session(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
        Commands::Inspect(args) => run_inspect(args),
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "command failed");
    }
    result
}

fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(
        ObservabilityConfig::from_verbosity(cli.verbose, cli.quiet).with_log_format(cli.log_format.into()),
    )
}
