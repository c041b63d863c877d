//! Bounded buffer of the most recently written lines

use std::sync::Mutex;

use ringbuf::{traits::*, HeapRb};

/// Last N lines written by the sink, oldest first
///
/// Filled by the sink consumer; everybody else only reads snapshots.
pub struct RecentLines {
    lines: Mutex<HeapRb<String>>,
}

impl RecentLines {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(HeapRb::new(capacity.max(1))),
        }
    }

    /// Append a line, evicting the oldest when full
    pub fn push(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_overwrite(line.to_string());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RecentLines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecentLines").field("len", &self.len()).finish()
    }
}
