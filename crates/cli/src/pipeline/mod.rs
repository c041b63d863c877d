//! Session runner: platform setup, status sampling and shutdown.

mod orchestrator;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig, PlatformSource};
pub use stats::{PipelineStats, StopReason};
