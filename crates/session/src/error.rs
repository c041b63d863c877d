//! Session error types

use std::path::PathBuf;

use dispatcher::DispatcherError;
use thiserror::Error;

use crate::status::SessionState;

/// Session-level errors
///
/// Adapter registration failures are not session errors; they are reported
/// per adapter in `StartSummary` and the status snapshot.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Output file could not be created
    #[error("failed to open log file in '{}': {source}", dir.display())]
    Output {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Lifecycle call not allowed in the current state
    #[error("session cannot start: already {state}")]
    InvalidState { state: SessionState },

    #[error(transparent)]
    Dispatcher(#[from] DispatcherError),
}

impl SessionError {
    pub fn output(dir: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            dir: dir.into(),
            source,
        }
    }
}

/// Session Result type alias
pub type Result<T> = std::result::Result<T, SessionError>;
