//! Clock implementations

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use chrono::Utc;
use contracts::Clock;

/// Wall clock from `chrono::Utc`, elapsed time from a monotonic `Instant`
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn utc_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn elapsed_realtime_nanos(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(i64::MAX)
    }
}

/// Hand-driven clock for tests and replays
///
/// Every `elapsed_realtime_nanos` read advances the monotonic time by
/// `step_nanos`, so consecutive arrivals stay strictly ordered.
#[derive(Debug)]
pub struct ManualClock {
    utc_millis: AtomicI64,
    elapsed_nanos: AtomicI64,
    step_nanos: i64,
}

impl ManualClock {
    pub fn new(utc_millis: i64, elapsed_nanos: i64) -> Self {
        Self {
            utc_millis: AtomicI64::new(utc_millis),
            elapsed_nanos: AtomicI64::new(elapsed_nanos),
            step_nanos: 0,
        }
    }

    pub fn with_step(mut self, step_nanos: i64) -> Self {
        self.step_nanos = step_nanos;
        self
    }

    pub fn set_utc_millis(&self, millis: i64) {
        self.utc_millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance_nanos(&self, nanos: i64) {
        self.elapsed_nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn utc_millis(&self) -> i64 {
        self.utc_millis.load(Ordering::SeqCst)
    }

    fn elapsed_realtime_nanos(&self) -> i64 {
        self.elapsed_nanos.fetch_add(self.step_nanos, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.elapsed_realtime_nanos();
        let b = clock.elapsed_realtime_nanos();
        assert!(b >= a);
        assert!(clock.utc_millis() > 1_600_000_000_000);
    }

    #[test]
    fn manual_clock_steps() {
        let clock = ManualClock::new(1000, 10).with_step(5);
        assert_eq!(clock.elapsed_realtime_nanos(), 10);
        assert_eq!(clock.elapsed_realtime_nanos(), 15);
        clock.advance_nanos(100);
        assert_eq!(clock.elapsed_realtime_nanos(), 120);
        assert_eq!(clock.utc_millis(), 1000);
    }
}
