//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - `utcTimeMillis`: wall clock at record arrival
//! - `elapsedRealtime_nanosecond`: boot-relative monotonic time of the event

mod blueprint;
mod clock;
mod error;
mod event;
mod kind;
mod platform;
mod record;
mod sink;
mod tag;

pub use blueprint::*;
pub use clock::Clock;
pub use error::*;
pub use event::*;
pub use kind::{HardwareSensorType, SensorKind};
pub use platform::*;
pub use record::*;
pub use sink::*;
pub use tag::Tag;
