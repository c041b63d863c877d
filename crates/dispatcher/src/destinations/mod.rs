//! Destination implementations
//!
//! Contains FileDestination, MemoryDestination, and TracingDestination.

mod file;
mod memory;
mod trace;

pub use self::file::{log_file_name, FileDestination};
pub use self::memory::{MemoryBuffer, MemoryDestination};
pub use self::trace::TracingDestination;
