//! # Platform Sim
//!
//! Off-device `SensorPlatform` implementations.
//!
//! - `SimulatedDevice`: capabilities from a `DeviceProfile`, synthetic
//!   generators per subscription, injectable permission denials and
//!   subscription failures, manual `emit` for tests
//! - `ReplayPlatform`: plays back a JSONL recording of raw events

mod device;
mod error;
mod profile;
mod registry;
mod replay;
mod synth;

pub use device::SimulatedDevice;
pub use error::{Result, SimError};
pub use profile::{permissions, required_permission, DeviceProfile};
pub use replay::{parse_entries, ReplayConfig, ReplayEntry, ReplayHandle, ReplayPlatform};
pub use synth::{interval_for, synthesize, SIM_EPOCH_MILLIS};
