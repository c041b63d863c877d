//! FileDestination - appends lines to a CSV log file

use chrono::{DateTime, Utc};
use contracts::{LogDestination, SinkError};
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Output file name for a session opened at `opened_at`
pub fn log_file_name(prefix: &str, opened_at: DateTime<Utc>) -> String {
    format!("{}_{}.csv", prefix, opened_at.format("%Y%m%d_%H%M%S"))
}

/// Destination writing one line per `write_line` to a local file
///
/// Writes are synchronous; the sink worker is the only caller.
pub struct FileDestination {
    name: String,
    path: PathBuf,
    file: Option<File>,
    /// Bytes known to be fully written
    committed: u64,
    /// Simulated storage size, writes past it fail
    capacity_limit: Option<u64>,
}

impl FileDestination {
    /// Create a new file, failing if it already exists
    pub fn create(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;

        debug!(path = %path.display(), "Log file created");
        Ok(Self {
            name: format!("file:{}", path.display()),
            path,
            file: Some(file),
            committed: 0,
            capacity_limit: None,
        })
    }

    /// Create `<prefix>_<yyyyMMdd_HHmmss>.csv` inside `dir`
    pub fn create_in(dir: &Path, prefix: &str) -> std::io::Result<Self> {
        Self::create(dir.join(log_file_name(prefix, Utc::now())))
    }

    /// Fail any write that would grow the file beyond `bytes`
    pub fn with_capacity_limit(mut self, bytes: u64) -> Self {
        self.capacity_limit = Some(bytes);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_bytes(file: &mut File, data: &[u8], limit: Option<u64>, committed: u64) -> std::io::Result<()> {
        if let Some(limit) = limit {
            let room = limit.saturating_sub(committed) as usize;
            if data.len() > room {
                // storage runs out part way through the line
                file.write_all(&data[..room])?;
                return Err(std::io::Error::other("no space left on device"));
            }
        }
        file.write_all(data)
    }

    /// Drop whatever a failed write left behind
    fn rollback(file: &mut File, committed: u64) -> std::io::Result<()> {
        file.set_len(committed)?;
        file.seek(SeekFrom::Start(committed))?;
        Ok(())
    }
}

impl LogDestination for FileDestination {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| SinkError::closed(&self.name))?;

        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');

        match Self::write_bytes(file, &data, self.capacity_limit, self.committed) {
            Ok(()) => {
                self.committed += data.len() as u64;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = Self::rollback(file, self.committed) {
                    warn!(sink = %self.name, error = %rollback, "Could not truncate partial line");
                }
                Err(SinkError::write(&self.name, e.to_string()))
            }
        }
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        if let Some(file) = self.file.as_mut() {
            file.flush()
                .and_then(|_| file.sync_data())
                .map_err(|e| SinkError::write(&self.name, e.to_string()))?;
        }
        Ok(())
    }

    #[instrument(name = "file_destination_close", skip(self), fields(sink = %self.name))]
    async fn close(&mut self) -> Result<(), SinkError> {
        if let Some(mut file) = self.file.take() {
            file.flush()
                .map_err(|e| SinkError::write(&self.name, e.to_string()))?;
            info!(path = %self.path.display(), bytes = self.committed, "Log file closed");
        }
        Ok(())
    }
}
