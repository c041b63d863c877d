//! EventSink - ordered asynchronous sink with a single consumer task
//!
//! Any number of producers (platform callback threads included) call
//! `submit`; it only enqueues. One worker task owns the destination and
//! writes entries in the exact order they were enqueued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use contracts::{LogDestination, LogEntry, RecordSink, SinkError};
use serde::Serialize;
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::metrics::{MetricsSnapshot, SinkMetrics};

/// Called with every line right after it was written
pub type LineObserver = Arc<dyn Fn(&str) + Send + Sync>;

enum SinkMessage {
    Entries(Vec<LogEntry>),
    Close,
}

/// Final outcome of a sink, returned by `close`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SinkReport {
    pub written: u64,
    pub discarded: u64,
    pub failure: Option<SinkError>,
}

/// State shared between producers and the worker
struct SinkShared {
    name: String,
    accepting: AtomicBool,
    failure: Mutex<Option<SinkError>>,
    failure_tx: watch::Sender<Option<SinkError>>,
    metrics: SinkMetrics,
}

impl SinkShared {
    fn failure(&self) -> Option<SinkError> {
        self.failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn fail(&self, err: SinkError) {
        self.accepting.store(false, Ordering::SeqCst);
        let mut failure = self
            .failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if failure.is_none() {
            *failure = Some(err.clone());
            self.failure_tx.send_replace(Some(err));
        }
    }

    /// Error for a refused submission
    fn refusal(&self) -> SinkError {
        match self.failure() {
            Some(err) => SinkError::failed(&self.name, err.to_string()),
            None => SinkError::closed(&self.name),
        }
    }
}

enum WorkerState {
    Running(JoinHandle<SinkReport>),
    Closed(SinkReport),
}

/// Handle to a running sink worker
pub struct EventSink {
    shared: Arc<SinkShared>,
    tx: mpsc::UnboundedSender<SinkMessage>,
    worker: AsyncMutex<WorkerState>,
}

impl EventSink {
    /// Create a new EventSink and spawn the worker task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<D: LogDestination + Send + 'static>(destination: D) -> Self {
        Self::spawn_with_observer(destination, None)
    }

    /// Like `spawn`, calling `observer` after each successful write
    pub fn spawn_with_observer<D: LogDestination + Send + 'static>(
        destination: D,
        observer: Option<LineObserver>,
    ) -> Self {
        let name = destination.name().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        let (failure_tx, _) = watch::channel(None);
        let shared = Arc::new(SinkShared {
            name,
            accepting: AtomicBool::new(true),
            failure: Mutex::new(None),
            failure_tx,
            metrics: SinkMetrics::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = tokio::spawn(async move {
            sink_worker(destination, rx, worker_shared, observer).await
        });

        Self {
            shared,
            tx,
            worker: AsyncMutex::new(WorkerState::Running(worker)),
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn is_accepting(&self) -> bool {
        self.shared.accepting.load(Ordering::SeqCst)
    }

    /// The fatal write error, if one happened
    pub fn failure(&self) -> Option<SinkError> {
        self.shared.failure()
    }

    /// Resolves when the sink hits a fatal write error
    ///
    /// Never resolves for a sink that closes cleanly.
    pub async fn failed(&self) -> SinkError {
        let mut rx = self.shared.failure_tx.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(err) = current {
                return err;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    fn enqueue(&self, entries: Vec<LogEntry>) -> Result<(), SinkError> {
        let count = entries.len();
        if !self.is_accepting() {
            self.shared.metrics.count_rejected(count);
            return Err(self.shared.refusal());
        }
        match self.tx.send(SinkMessage::Entries(entries)) {
            Ok(()) => {
                self.shared.metrics.count_accepted(count);
                trace!(sink = %self.shared.name, entries = count, "entries queued");
                Ok(())
            }
            Err(_) => {
                self.shared.metrics.count_rejected(count);
                Err(self.shared.refusal())
            }
        }
    }

    /// Stop accepting, drain what was already submitted, release the destination
    ///
    /// Idempotent: later calls return the same report.
    #[instrument(name = "event_sink_close", skip(self), fields(sink = %self.shared.name))]
    pub async fn close(&self) -> SinkReport {
        let mut worker = self.worker.lock().await;
        if let WorkerState::Closed(report) = &*worker {
            return report.clone();
        }

        self.shared.accepting.store(false, Ordering::SeqCst);
        // fails only when the worker already exited
        let _ = self.tx.send(SinkMessage::Close);

        let report = match std::mem::replace(&mut *worker, WorkerState::Closed(SinkReport::default())) {
            WorkerState::Running(handle) => match handle.await {
                Ok(report) => report,
                Err(e) => {
                    error!(sink = %self.shared.name, error = ?e, "Worker task panicked");
                    SinkReport {
                        failure: self.shared.failure(),
                        ..SinkReport::default()
                    }
                }
            },
            WorkerState::Closed(report) => report,
        };

        *worker = WorkerState::Closed(report.clone());
        info!(
            sink = %self.shared.name,
            written = report.written,
            discarded = report.discarded,
            failed = report.failure.is_some(),
            "EventSink closed"
        );
        report
    }
}

impl RecordSink for EventSink {
    fn submit(&self, entry: LogEntry) -> Result<(), SinkError> {
        self.enqueue(vec![entry])
    }

    fn submit_all(&self, entries: Vec<LogEntry>) -> Result<(), SinkError> {
        if entries.is_empty() {
            return Ok(());
        }
        self.enqueue(entries)
    }
}

/// Worker task that consumes entries and writes them to the destination
#[instrument(
    name = "sink_worker_loop",
    skip(destination, rx, shared, observer),
    fields(sink = %shared.name)
)]
async fn sink_worker<D: LogDestination>(
    mut destination: D,
    mut rx: mpsc::UnboundedReceiver<SinkMessage>,
    shared: Arc<SinkShared>,
    observer: Option<LineObserver>,
) -> SinkReport {
    debug!(sink = %shared.name, "Sink worker started");
    let mut report = SinkReport::default();

    while let Some(message) = rx.recv().await {
        shared.metrics.set_pending(rx.len());
        metrics::gauge!("sensor_logger_sink_queue_depth", "sink" => shared.name.clone()).set(rx.len() as f64);

        let entries = match message {
            SinkMessage::Close => {
                // already queued messages are still delivered
                rx.close();
                continue;
            }
            SinkMessage::Entries(entries) => entries,
        };

        if report.failure.is_some() {
            report.discarded += entries.len() as u64;
            shared.metrics.count_discarded(entries.len());
            continue;
        }

        let total = entries.len();
        let written_before = report.written;
        for (index, entry) in entries.into_iter().enumerate() {
            let line = entry.render();
            match destination.write_line(&line).await {
                Ok(()) => {
                    report.written += 1;
                    shared.metrics.count_written();
                    if let Some(observer) = &observer {
                        observer(&line);
                    }
                }
                Err(e) => {
                    shared.metrics.count_write_failure();
                    metrics::counter!("sensor_logger_write_failures_total", "sink" => shared.name.clone()).increment(1);
                    error!(sink = %shared.name, error = %e, "Write failed, sink stops accepting");
                    shared.fail(e.clone());
                    report.failure = Some(e);
                    rx.close();

                    let remaining = total - index - 1;
                    report.discarded += remaining as u64;
                    shared.metrics.count_discarded(remaining);
                    break;
                }
            }
        }
        metrics::counter!("sensor_logger_lines_written_total", "sink" => shared.name.clone())
            .increment(report.written - written_before);
    }

    // Cleanup
    if report.failure.is_none() {
        if let Err(e) = destination.flush().await {
            error!(sink = %shared.name, error = %e, "Flush failed on shutdown");
            shared.fail(e.clone());
            report.failure = Some(e);
        }
    }
    if let Err(e) = destination.close().await {
        warn!(sink = %shared.name, error = %e, "Close failed on shutdown");
    }
    shared.metrics.set_pending(0);

    debug!(sink = %shared.name, "Sink worker stopped");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destinations::MemoryDestination;
    use contracts::Record;
    use std::time::Duration;

    fn record(tag: &str, n: i64) -> LogEntry {
        LogEntry::Record(Record {
            tag: tag.into(),
            utc_millis: n,
            elapsed_realtime_nanos: n,
            fields: vec![n.to_string()],
            arrival_nanos: n,
        })
    }

    #[tokio::test]
    async fn writes_in_submission_order() {
        let destination = MemoryDestination::new("mem");
        let buffer = destination.buffer();
        let sink = EventSink::spawn(destination);

        for i in 0..100 {
            sink.submit(record("ACC", i)).unwrap();
        }
        let report = sink.close().await;

        assert_eq!(report.written, 100);
        let lines = buffer.lines();
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(*line, format!("ACC,{i},{i},{i}"));
        }
    }

    #[tokio::test]
    async fn close_is_idempotent_and_rejects_later_submits() {
        let sink = EventSink::spawn(MemoryDestination::new("mem"));
        sink.submit(LogEntry::comment("hello")).unwrap();

        let first = sink.close().await;
        let second = sink.close().await;
        assert_eq!(first, second);
        assert_eq!(first.written, 1);

        let err = sink.submit(record("GYRO", 1)).unwrap_err();
        assert_eq!(err, SinkError::closed("mem"));
        assert_eq!(sink.metrics().rejected, 1);
    }

    #[tokio::test]
    async fn submit_works_from_plain_threads() {
        let destination = MemoryDestination::new("mem");
        let buffer = destination.buffer();
        let sink = Arc::new(EventSink::spawn(destination));

        let handles: Vec<_> = ["ACC", "GYRO", "MAG"]
            .into_iter()
            .map(|tag| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        sink.submit(record(tag, i)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        sink.close().await;
        let lines = buffer.lines();
        assert_eq!(lines.len(), 600);
        for tag in ["ACC", "GYRO", "MAG"] {
            let seq: Vec<i64> = lines
                .iter()
                .filter(|l| l.starts_with(&format!("{tag},")))
                .map(|l| l.split(',').nth(1).unwrap().parse().unwrap())
                .collect();
            assert_eq!(seq, (0..200).collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn write_failure_is_fatal_and_reported() {
        let destination = MemoryDestination::new("mem").fail_after(3);
        let buffer = destination.buffer();
        let sink = EventSink::spawn(destination);

        sink.submit_all((0..5).map(|i| record("PSR", i)).collect()).unwrap();

        let err = tokio::time::timeout(Duration::from_secs(2), sink.failed())
            .await
            .unwrap();
        assert!(matches!(err, SinkError::Write { .. }));
        assert!(!sink.is_accepting());
        assert!(matches!(
            sink.submit(record("PSR", 9)),
            Err(SinkError::Failed { .. })
        ));

        let report = sink.close().await;
        assert_eq!(report.written, 3);
        assert_eq!(report.discarded, 1);
        assert!(report.failure.is_some());
        assert_eq!(buffer.lines().len(), 3);
    }

    #[tokio::test]
    async fn observer_sees_written_lines() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let observer: LineObserver = Arc::new(move |line| {
            seen_clone.lock().unwrap().push(line.to_string());
        });

        let sink = EventSink::spawn_with_observer(MemoryDestination::new("mem"), Some(observer));
        sink.submit(LogEntry::comment("")).unwrap();
        sink.submit(record("HR", 1)).unwrap();
        sink.close().await;

        assert_eq!(*seen.lock().unwrap(), vec!["#".to_string(), "HR,1,1,1".to_string()]);
    }
}
