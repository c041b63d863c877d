//! Statistics of one session run.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use dispatcher::{SinkReport, TelemetryStats};
use observability::SessionMetricsAggregator;
use session::StartSummary;

/// Why the session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Signal,
    Duration,
    ReplayFinished,
    SinkFailed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal => write!(f, "shutdown signal"),
            Self::Duration => write!(f, "duration elapsed"),
            Self::ReplayFinished => write!(f, "replay finished"),
            Self::SinkFailed(message) => write!(f, "log write failed: {message}"),
        }
    }
}

/// Statistics from a session run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub duration: Duration,
    pub stop_reason: StopReason,
    pub output_path: Option<PathBuf>,
    pub start: StartSummary,
    /// `None` if the session had already been stopped
    pub report: Option<SinkReport>,
    pub telemetry: Option<TelemetryStats>,
    pub recent_lines: Vec<String>,
    pub metrics: SessionMetricsAggregator,
}

impl PipelineStats {
    /// Lines written per second
    pub fn lines_per_sec(&self) -> f64 {
        let written = self.report.as_ref().map_or(0, |r| r.written);
        if self.duration.as_secs_f64() > 0.0 {
            written as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        println!("\nSession Statistics\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Stopped by: {}", self.stop_reason);
        if let Some(ref path) = self.output_path {
            println!("   ├─ Log file: {}", path.display());
        }
        println!("   ├─ Lines/s: {:.1}", self.lines_per_sec());
        println!(
            "   └─ Sensors: {} registered, {} unavailable, {} disabled, {} failed",
            self.start.registered.len(),
            self.start.unavailable.len(),
            self.start.disabled.len(),
            self.start.failed.len()
        );

        if let Some(ref report) = self.report {
            println!("\nLog");
            println!("   ├─ Written: {}", report.written);
            println!("   ├─ Discarded: {}", report.discarded);
            match report.failure {
                Some(ref failure) => println!("   └─ Failure: {}", failure),
                None => println!("   └─ Failure: none"),
            }
        }

        if let Some(ref telemetry) = self.telemetry {
            println!("\nTelemetry");
            println!("   ├─ Sent: {}", telemetry.sent);
            println!("   ├─ Dropped: {}", telemetry.dropped);
            println!("   └─ Send errors: {}", telemetry.send_errors);
        }

        println!("\n{}", self.metrics.summary());

        if !self.recent_lines.is_empty() {
            println!("Last lines:");
            for line in &self.recent_lines {
                println!("   {}", line);
            }
        }
        println!();
    }
}
