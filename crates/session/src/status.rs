//! Session state and status snapshots

use std::fmt;

use contracts::Tag;
use dispatcher::MetricsSnapshot;
use ingestion::{AdapterStatusSnapshot, RegistrationError};
use serde::Serialize;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    Started,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Read-only view for status displays
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub adapters: Vec<AdapterStatusSnapshot>,
    pub sink: MetricsSnapshot,
    pub sink_failure: Option<String>,
}

impl SessionStatus {
    /// Look up by `AdapterStatusSnapshot::key`, e.g. `ACC` or `Fix/gps`
    pub fn adapter(&self, key: &str) -> Option<&AdapterStatusSnapshot> {
        self.adapters.iter().find(|a| a.key() == key)
    }

    pub fn registered_count(&self) -> usize {
        self.adapters.iter().filter(|a| a.registered).count()
    }
}

/// Outcome of `start`
#[derive(Debug, Clone, Default)]
pub struct StartSummary {
    pub registered: Vec<Tag>,
    /// Not present on the device
    pub unavailable: Vec<Tag>,
    /// Switched off in the configuration
    pub disabled: Vec<Tag>,
    pub failed: Vec<(Tag, RegistrationError)>,
}

impl StartSummary {
    pub fn permission_denied(&self) -> impl Iterator<Item = &Tag> {
        self.failed
            .iter()
            .filter(|(_, err)| err.is_permission_denied())
            .map(|(tag, _)| tag)
    }
}
