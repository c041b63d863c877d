//! SessionController - adapter lifecycle and output ownership
//!
//! Created -> Started -> Stopped. The controller owns the adapters and the
//! event sink; nothing is restarted or retried.

use std::sync::{Arc, Mutex};

use contracts::{AdapterConfig, Clock, FixObserver, LogDestination, LogEntry, RecordSink, SensorPlatform};
use dispatcher::{EventSink, LineObserver, SinkReport};
use ingestion::{build_adapters, SensorAdapter, SystemClock};
use records::preamble;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SessionError};
use crate::recent::RecentLines;
use crate::status::{SessionState, SessionStatus, StartSummary};

/// Default size of the recent line buffer
pub const DEFAULT_RECENT_CAPACITY: usize = 64;

/// Optional collaborators of a session
#[derive(Clone)]
pub struct SessionOptions {
    pub clock: Arc<dyn Clock>,
    pub fix_observer: Option<Arc<dyn FixObserver>>,
    pub recent_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock::new()),
            fix_observer: None,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
        }
    }
}

impl SessionOptions {
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_fix_observer(mut self, observer: Arc<dyn FixObserver>) -> Self {
        self.fix_observer = Some(observer);
        self
    }

    pub fn with_recent_capacity(mut self, capacity: usize) -> Self {
        self.recent_capacity = capacity;
        self
    }
}

struct ManagedAdapter {
    adapter: Arc<dyn SensorAdapter>,
    enabled: bool,
}

/// Owns one logging session
pub struct SessionController {
    platform: Arc<dyn SensorPlatform>,
    adapters: Vec<ManagedAdapter>,
    sink: Arc<EventSink>,
    recent: Arc<RecentLines>,
    state: Mutex<SessionState>,
    /// Serializes start and stop
    lifecycle: AsyncMutex<()>,
}

impl SessionController {
    /// Build every configured adapter and spawn the sink over `destination`
    ///
    /// Must be called from within a tokio runtime. Nothing is written until `start`.
    pub fn new<D: LogDestination + Send + 'static>(
        configs: &[AdapterConfig],
        platform: Arc<dyn SensorPlatform>,
        destination: D,
        options: SessionOptions,
    ) -> Self {
        let recent = Arc::new(RecentLines::new(options.recent_capacity));
        let tap = Arc::clone(&recent);
        let observer: LineObserver = Arc::new(move |line: &str| tap.push(line));
        let sink = Arc::new(EventSink::spawn_with_observer(destination, Some(observer)));

        let record_sink: Arc<dyn RecordSink> = sink.clone();
        let adapters = build_adapters(
            configs,
            Arc::clone(&platform),
            record_sink,
            options.clock,
            options.fix_observer,
        )
        .into_iter()
        .zip(configs)
        .map(|(adapter, config)| ManagedAdapter {
            adapter,
            enabled: config.enabled,
        })
        .collect();

        Self {
            platform,
            adapters,
            sink,
            recent,
            state: Mutex::new(SessionState::Created),
            lifecycle: AsyncMutex::new(()),
        }
    }

    pub fn state(&self) -> SessionState {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: SessionState) {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    pub fn adapters(&self) -> impl Iterator<Item = &Arc<dyn SensorAdapter>> {
        self.adapters.iter().map(|managed| &managed.adapter)
    }

    pub fn sink(&self) -> &EventSink {
        &self.sink
    }

    /// Write the preamble and every adapter header, registering available adapters
    ///
    /// Registration failures never fail the session; they are listed in the summary.
    ///
    /// # Errors
    /// `InvalidState` when the session was already started or stopped.
    #[instrument(name = "session_start", skip(self), fields(adapters = self.adapters.len()))]
    pub async fn start(&self) -> Result<StartSummary> {
        let _lifecycle = self.lifecycle.lock().await;
        let state = self.state();
        if state != SessionState::Created {
            return Err(SessionError::InvalidState { state });
        }

        if let Err(err) = self.sink.submit_all(preamble(&self.platform.device_info())) {
            warn!(error = %err, "preamble rejected by sink");
        }

        let mut summary = StartSummary::default();
        for managed in &self.adapters {
            let adapter = &managed.adapter;
            let tag = adapter.tag().clone();

            if !managed.enabled || !adapter.is_available() {
                if let Err(err) = self.sink.submit_all(adapter.header()) {
                    warn!(tag = %tag, error = %err, "header rejected by sink");
                }
                if managed.enabled {
                    debug!(tag = %tag, kind = %adapter.kind(), "adapter unavailable");
                    summary.unavailable.push(tag);
                } else {
                    summary.disabled.push(tag);
                }
                continue;
            }

            match adapter.register() {
                Ok(()) => summary.registered.push(tag),
                Err(err) => summary.failed.push((tag, err)),
            }
        }

        self.set_state(SessionState::Started);
        metrics::gauge!("sensor_logger_registered_adapters").set(summary.registered.len() as f64);
        info!(
            registered = summary.registered.len(),
            unavailable = summary.unavailable.len(),
            disabled = summary.disabled.len(),
            failed = summary.failed.len(),
            "Session started"
        );
        Ok(summary)
    }

    /// Unregister registered adapters, then drain and close the sink
    ///
    /// Returns `None` when there was nothing to stop (never started, or stopped before).
    #[instrument(name = "session_stop", skip(self))]
    pub async fn stop(&self) -> Option<SinkReport> {
        let _lifecycle = self.lifecycle.lock().await;
        match self.state() {
            SessionState::Created => {
                debug!("stop before start ignored");
                return None;
            }
            SessionState::Stopped => {
                debug!("session already stopped");
                return None;
            }
            SessionState::Started => {}
        }

        let mut unregistered = 0usize;
        for managed in &self.adapters {
            if managed.adapter.is_registered() {
                managed.adapter.unregister();
                unregistered += 1;
            }
        }

        let report = self.sink.close().await;
        self.set_state(SessionState::Stopped);
        metrics::gauge!("sensor_logger_registered_adapters").set(0.0);
        info!(
            unregistered,
            written = report.written,
            discarded = report.discarded,
            failed = report.failure.is_some(),
            "Session stopped"
        );
        Some(report)
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state(),
            adapters: self.adapters().map(|adapter| adapter.status()).collect(),
            sink: self.sink.metrics(),
            sink_failure: self.sink.failure().map(|err| err.to_string()),
        }
    }

    pub fn recent_lines(&self) -> Vec<String> {
        self.recent.snapshot()
    }

    /// Resolves once the sink hit a fatal write error
    pub async fn sink_failed(&self) -> contracts::SinkError {
        self.sink.failed().await
    }

    /// Submit a comment line through the session's sink
    pub fn comment(&self, text: impl Into<String>) -> std::result::Result<(), contracts::SinkError> {
        self.sink.submit(LogEntry::comment(text))
    }
}
