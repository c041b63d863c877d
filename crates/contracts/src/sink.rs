//! Output interfaces
//!
//! `RecordSink` is what adapters push into, `LogDestination` is the byte
//! stream the sink consumer owns, and `FixObserver` receives location fixes
//! outside the logging path.

use crate::{LocationFix, LogEntry, SinkError};

/// Non-blocking entry submission, shared by every adapter of a session
pub trait RecordSink: Send + Sync {
    /// Queue one entry. Never performs the write itself.
    ///
    /// # Errors
    /// `SinkError::Closed` after close, `SinkError::Failed` after a fatal write error.
    fn submit(&self, entry: LogEntry) -> Result<(), SinkError>;

    /// Queue several entries as one contiguous run
    fn submit_all(&self, entries: Vec<LogEntry>) -> Result<(), SinkError>;
}

/// Append-only line destination
#[trait_variant::make(LogDestination: Send)]
pub trait LocalLogDestination {
    /// Destination name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Append one line plus newline
    ///
    /// # Errors
    /// On failure nothing of `line` may remain in the destination.
    async fn write_line(&mut self, line: &str) -> Result<(), SinkError>;

    async fn flush(&mut self) -> Result<(), SinkError>;

    async fn close(&mut self) -> Result<(), SinkError>;
}

/// Receives each formatted location fix; must not block
pub trait FixObserver: Send + Sync {
    fn on_fix(&self, fix: &LocationFix);
}
