//! # Dispatcher
//!
//! Ordered log output.
//!
//! Responsibilities:
//! - Accept entries from any thread without blocking (`RecordSink`)
//! - Write them in submission order from one consumer task
//! - Turn the first write failure into a fatal, observable sink state
//! - Publish location fixes over UDP without touching the log path

pub mod destinations;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod telemetry;

pub use destinations::{
    log_file_name, FileDestination, MemoryBuffer, MemoryDestination, TracingDestination,
};
pub use error::{DispatcherError, Result};
pub use handle::{EventSink, LineObserver, SinkReport};
pub use self::metrics::{MetricsSnapshot, SinkMetrics};
pub use telemetry::{TelemetryStats, UdpFixPublisher};
