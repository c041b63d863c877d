//! # Ingestion
//!
//! Sensor adapters: the bridge between platform event sources and the
//! record pipeline.
//!
//! Responsibilities:
//! - Decide availability once, from the platform capability surface
//! - Subscribe / unsubscribe through `SensorPlatform`
//! - Format each raw event and submit the records without blocking
//! - Keep per-adapter flags and counters for status queries
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{build_adapters, SystemClock};
//!
//! let adapters = build_adapters(&blueprint.sensors, platform, sink, Arc::new(SystemClock::new()), None);
//! for adapter in &adapters {
//!     if adapter.is_available() {
//!         let _ = adapter.register();
//!     }
//! }
//! ```

mod adapter;
mod clock;
mod error;
mod source;
mod state;

// Re-exports
pub use adapter::{build_adapters, PlatformAdapter, SensorAdapter};
pub use clock::{ManualClock, SystemClock};
pub use error::{RegistrationError, Result};
pub use source::AdapterSource;
pub use state::{AdapterState, AdapterStatusSnapshot};
