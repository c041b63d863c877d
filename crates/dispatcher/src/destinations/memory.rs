//! MemoryDestination - keeps lines in a shared buffer

use contracts::{LogDestination, SinkError};
use std::sync::{Arc, Mutex};

/// Cloneable view of the lines a `MemoryDestination` received
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryBuffer {
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffer content as file text
    pub fn text(&self) -> String {
        self.lines().iter().map(|line| format!("{line}\n")).collect()
    }

    fn push(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_string());
    }
}

/// In-memory destination for tests and embedding
#[derive(Debug)]
pub struct MemoryDestination {
    name: String,
    buffer: MemoryBuffer,
    fail_after: Option<usize>,
    closed: bool,
}

impl MemoryDestination {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buffer: MemoryBuffer::default(),
            fail_after: None,
            closed: false,
        }
    }

    /// Accept `lines` lines, then fail every write
    pub fn fail_after(mut self, lines: usize) -> Self {
        self.fail_after = Some(lines);
        self
    }

    pub fn buffer(&self) -> MemoryBuffer {
        self.buffer.clone()
    }
}

impl LogDestination for MemoryDestination {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::closed(&self.name));
        }
        if self.fail_after.is_some_and(|limit| self.buffer.len() >= limit) {
            return Err(SinkError::write(&self.name, "injected write failure"));
        }
        self.buffer.push(line);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        self.closed = true;
        Ok(())
    }
}
