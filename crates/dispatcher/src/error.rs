//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Destination creation error
    #[error("failed to create destination '{name}': {message}")]
    DestinationCreation { name: String, message: String },

    /// Telemetry publisher setup error
    #[error("telemetry setup failed for '{addr}': {message}")]
    Telemetry { addr: String, message: String },

    /// Sink error (from contract)
    #[error("sink error: {0}")]
    Sink(#[from] contracts::SinkError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a destination creation error
    pub fn destination_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DestinationCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn telemetry(addr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Telemetry {
            addr: addr.into(),
            message: message.into(),
        }
    }
}

/// Dispatcher Result type alias
pub type Result<T> = std::result::Result<T, DispatcherError>;
