//! Lock-free sink counters
//!
//! Producers bump `accepted` / `rejected`, the consumer task owns the rest.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Entry batches waiting for the consumer
    pending: AtomicUsize,
    accepted: AtomicU64,
    lines_written: AtomicU64,
    /// At most one, the sink stops after it
    write_failures: AtomicU64,
    /// Refused because the sink was closed or failed
    rejected: AtomicU64,
    /// Accepted but thrown away after a write failure
    discarded: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pending(&self, batches: usize) {
        self.pending.store(batches, Ordering::Relaxed);
    }

    pub fn count_accepted(&self, entries: usize) {
        self.accepted.fetch_add(entries as u64, Ordering::Relaxed);
    }

    pub fn count_written(&self) {
        self.lines_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_rejected(&self, entries: usize) {
        self.rejected.fetch_add(entries as u64, Ordering::Relaxed);
    }

    pub fn count_discarded(&self, entries: usize) {
        self.discarded.fetch_add(entries as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pending: self.pending.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            lines_written: self.lines_written.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `SinkMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub pending: usize,
    pub accepted: u64,
    pub lines_written: u64,
    pub write_failures: u64,
    pub rejected: u64,
    pub discarded: u64,
}

impl MetricsSnapshot {
    /// Accepted entries that have neither been written nor discarded yet
    pub fn in_flight(&self) -> u64 {
        self.accepted
            .saturating_sub(self.lines_written)
            .saturating_sub(self.discarded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_counts_unsettled_entries() {
        let metrics = SinkMetrics::new();
        metrics.count_accepted(5);
        metrics.count_written();
        metrics.count_written();
        metrics.count_discarded(1);
        metrics.count_rejected(4);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.in_flight(), 2);
        assert_eq!(snapshot.rejected, 4);
        assert_eq!(snapshot.write_failures, 0);
    }
}
