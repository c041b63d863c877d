//! Adapter state and status snapshot
//!
//! Flags and counters are written from platform callback threads and read
//! by the session for status reporting, so everything is atomic.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use contracts::{SensorKind, Tag};
use serde::Serialize;

use crate::error::RegistrationError;

/// Shared mutable state of one adapter
#[derive(Debug)]
pub struct AdapterState {
    /// Fixed at construction
    available: bool,

    registered: AtomicBool,

    /// Set by the first accepted event
    received: AtomicBool,

    /// Events whose records the sink accepted
    event_count: AtomicU64,

    /// Records submitted to the sink
    record_count: AtomicU64,

    /// Events whose category did not match the adapter kind
    mismatched_events: AtomicU64,

    /// Records the sink refused (closed or failed)
    rejected_records: AtomicU64,

    last_error: Mutex<Option<RegistrationError>>,
}

impl AdapterState {
    pub fn new(available: bool) -> Self {
        Self {
            available,
            registered: AtomicBool::new(false),
            received: AtomicBool::new(false),
            event_count: AtomicU64::new(0),
            record_count: AtomicU64::new(0),
            mismatched_events: AtomicU64::new(0),
            rejected_records: AtomicU64::new(0),
            last_error: Mutex::new(None),
        }
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        self.available
    }

    #[inline]
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    /// Returns the previous value
    pub fn set_registered(&self, registered: bool) -> bool {
        self.registered.swap(registered, Ordering::AcqRel)
    }

    /// Record one accepted event and the records it produced
    pub fn record_event(&self, records: usize) {
        self.received.store(true, Ordering::Release);
        self.event_count.fetch_add(1, Ordering::Relaxed);
        self.record_count.fetch_add(records as u64, Ordering::Relaxed);
    }

    pub fn record_mismatch(&self) {
        self.mismatched_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self, records: usize) {
        self.rejected_records
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    pub fn set_last_error(&self, err: Option<RegistrationError>) {
        let mut guard = self
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = err;
    }

    pub fn last_error(&self) -> Option<RegistrationError> {
        self.last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::Relaxed)
    }

    /// Get snapshot
    pub fn snapshot(&self, tag: &Tag, kind: &SensorKind) -> AdapterStatusSnapshot {
        let last_error = self.last_error();
        AdapterStatusSnapshot {
            tag: tag.to_string(),
            provider: None,
            kind: kind.clone(),
            available: self.available,
            registered: self.is_registered(),
            received: self.received.load(Ordering::Acquire),
            event_count: self.event_count.load(Ordering::Relaxed),
            record_count: self.record_count.load(Ordering::Relaxed),
            mismatched_events: self.mismatched_events.load(Ordering::Relaxed),
            rejected_records: self.rejected_records.load(Ordering::Relaxed),
            permission_denied: last_error
                .as_ref()
                .is_some_and(RegistrationError::is_permission_denied),
            last_error: last_error.map(|e| e.to_string()),
        }
    }
}

/// Read-only adapter status for host display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterStatusSnapshot {
    pub tag: String,
    /// Location provider; location adapters share their tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub kind: SensorKind,
    pub available: bool,
    pub registered: bool,
    pub received: bool,
    pub event_count: u64,
    pub record_count: u64,
    pub mismatched_events: u64,
    pub rejected_records: u64,
    /// Registration was refused by the OS; the host may prompt the user
    pub permission_denied: bool,
    pub last_error: Option<String>,
}

impl AdapterStatusSnapshot {
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Identifies the adapter within a session: `Fix/gps` for location
    /// adapters, the tag otherwise
    pub fn key(&self) -> String {
        match &self.provider {
            Some(provider) => format!("{}/{provider}", self.tag),
            None => self.tag.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_and_flags() {
        let state = AdapterState::new(true);
        assert!(!state.set_registered(true));
        state.record_event(3);
        state.record_event(1);
        state.record_mismatch();

        let snapshot = state.snapshot(&"Raw".into(), &SensorKind::GnssRawMeasurement);
        assert!(snapshot.available);
        assert!(snapshot.registered);
        assert!(snapshot.received);
        assert_eq!(snapshot.event_count, 2);
        assert_eq!(snapshot.record_count, 4);
        assert_eq!(snapshot.mismatched_events, 1);
        assert_eq!(snapshot.last_error, None);
    }

    #[test]
    fn permission_denial_is_flagged() {
        let state = AdapterState::new(true);
        state.set_last_error(Some(RegistrationError::PermissionDenied {
            tag: "BLE".into(),
            permission: "BLUETOOTH_SCAN".into(),
        }));
        let snapshot = state.snapshot(&"BLE".into(), &SensorKind::Bluetooth);
        assert!(snapshot.permission_denied);
        assert!(snapshot.last_error.unwrap().contains("BLUETOOTH_SCAN"));
    }

    #[test]
    fn location_snapshots_are_keyed_by_provider() {
        let state = AdapterState::new(true);
        let gps = state
            .snapshot(&"Fix".into(), &SensorKind::GnssLocation)
            .with_provider("gps");
        let network = state
            .snapshot(&"Fix".into(), &SensorKind::GnssLocation)
            .with_provider("network");
        assert_eq!(gps.key(), "Fix/gps");
        assert_ne!(gps.key(), network.key());

        let acc = state.snapshot(&"ACC".into(), &SensorKind::Accelerometer);
        assert_eq!(acc.key(), "ACC");
        assert!(!serde_json::to_string(&acc).unwrap().contains("provider"));
    }
}
