//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Log file could not be read
    #[error("Cannot read log file {}: {source}", path.display())]
    LogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The log destination failed while the session was running
    #[error("Logging stopped after a write failure: {message}")]
    SinkFailed { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn log_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LogRead {
            path: path.into(),
            source,
        }
    }

    pub fn sink_failed(message: impl Into<String>) -> Self {
        Self::SinkFailed {
            message: message.into(),
        }
    }
}
