//! # Session
//!
//! Session controller and host API.
//!
//! Responsibilities:
//! - Build one adapter per configured source, available or not
//! - Write the preamble and header block, register available adapters
//! - Unregister and drain the sink on stop (idempotent), or on a fatal write error
//! - Expose status snapshots, recent lines and sink failure to the host
//!
//! ## Usage Example
//!
//! ```ignore
//! let handle = session::start_session(&blueprint, platform).await?;
//! tokio::select! {
//!     _ = tokio::signal::ctrl_c() => {}
//!     err = handle.sink_failed() => tracing::error!(error = %err, "log write failed, session stopped"),
//! }
//! session::stop_session(&handle).await;
//! ```

mod controller;
mod error;
mod handle;
mod recent;
mod status;

pub use controller::{SessionController, SessionOptions, DEFAULT_RECENT_CAPACITY};
pub use error::{Result, SessionError};
pub use handle::{start_session, start_session_with, stop_session, SessionHandle};
pub use recent::RecentLines;
pub use status::{SessionState, SessionStatus, StartSummary};
