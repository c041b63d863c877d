//! Platform simulation error types

use thiserror::Error;

/// Errors raised while preparing a simulated or replayed platform
#[derive(Debug, Error)]
pub enum SimError {
    /// Replay file could not be read
    #[error("failed to read replay file '{path}': {source}")]
    ReplayRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Replay line is not a valid event record
    #[error("replay line {line}: {message}")]
    ReplayParse { line: usize, message: String },
}

impl SimError {
    pub fn replay_read(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::ReplayRead {
            path: path.into(),
            source,
        }
    }

    pub fn replay_parse(line: usize, message: impl Into<String>) -> Self {
        Self::ReplayParse {
            line,
            message: message.into(),
        }
    }
}

/// Platform simulation Result type alias
pub type Result<T> = std::result::Result<T, SimError>;
