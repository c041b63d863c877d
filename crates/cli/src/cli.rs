//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Sensor Logger - record phone sensor, GNSS and BLE events to a CSV log
#[derive(Parser, Debug)]
#[command(
    name = "sensor-logger",
    author,
    version,
    about = "Mobile sensor data logger",
    long_about = "Records motion, environment, GNSS and Bluetooth LE events into one \n\
                  comma-separated log per session, each record stamped with the \n\
                  wall clock and the boot-relative clock at arrival."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SENSOR_LOGGER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "SENSOR_LOGGER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a logging session
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display the configured sensors and their columns
    Info(InfoArgs),

    /// Summarize a produced log file
    Inspect(InspectArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in phone set when omitted
    #[arg(short, long, env = "SENSOR_LOGGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the output directory from configuration
    #[arg(short, long, env = "SENSOR_LOGGER_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Stop after this many seconds (0 = until Ctrl+C)
    #[arg(short, long, default_value = "0", env = "SENSOR_LOGGER_DURATION")]
    pub duration: u64,

    /// Replay recorded raw events (JSONL) instead of the simulated phone
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = recorded pace, 0 = as fast as possible)
    #[arg(long, default_value = "1.0")]
    pub replay_speed: f64,

    /// Send location fixes as UDP datagrams to host:port
    #[arg(long, env = "SENSOR_LOGGER_TELEMETRY")]
    pub telemetry: Option<String>,

    /// Seconds between status reports
    #[arg(long, default_value = "5")]
    pub status_interval: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "SENSOR_LOGGER_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without logging
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "session.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; built-in phone set when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the column line of every sensor
    #[arg(long)]
    pub columns: bool,
}

/// Arguments for the `inspect` command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Log file to summarize
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
