//! Clock trait - wall clock plus boot-relative monotonic clock

/// Time source used to stamp records at arrival
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn utc_millis(&self) -> i64;

    /// Monotonic nanoseconds since an arbitrary fixed origin
    fn elapsed_realtime_nanos(&self) -> i64;
}
