//! TracingDestination - emits every line as a debug event

use contracts::{LogDestination, SinkError};
use tracing::{debug, info, instrument};

/// Destination that only logs, for dry runs
pub struct TracingDestination {
    name: String,
    lines: u64,
}

impl TracingDestination {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: 0,
        }
    }
}

impl LogDestination for TracingDestination {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        self.lines += 1;
        debug!(sink = %self.name, line_no = self.lines, line, "log line");
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    #[instrument(name = "tracing_destination_close", skip(self))]
    async fn close(&mut self) -> Result<(), SinkError> {
        info!(sink = %self.name, lines = self.lines, "TracingDestination closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_everything() {
        let mut dest = TracingDestination::new("trace");
        assert!(dest.write_line("# hello").await.is_ok());
        assert!(dest.flush().await.is_ok());
        assert!(dest.close().await.is_ok());
        assert_eq!(dest.lines, 1);
    }
}
