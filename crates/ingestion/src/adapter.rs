//! Sensor adapter
//!
//! One adapter per monitored source. Every variant shares the same state
//! machine; only the `AdapterSource` differs.

use std::sync::{Arc, Mutex};

use contracts::{
    AdapterConfig, Clock, FixObserver, LogEntry, RawEvent, RawEventCallback, RecordSink,
    SensorKind, SensorPlatform, SubscriptionId, Tag,
};
use records::{disabled_header, enabled_header, format_event, ArrivalStamp};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{RegistrationError, Result};
use crate::source::AdapterSource;
use crate::state::{AdapterState, AdapterStatusSnapshot};

/// Capability set every adapter implements
pub trait SensorAdapter: Send + Sync {
    fn tag(&self) -> &Tag;

    fn kind(&self) -> &SensorKind;

    /// Fixed at construction, never re-evaluated
    fn is_available(&self) -> bool;

    fn is_registered(&self) -> bool;

    /// Subscribe to the underlying source and emit the header
    ///
    /// Registering an already registered adapter is a no-op.
    ///
    /// # Errors
    /// Capability absent, permission denied or subscription failure; the
    /// adapter then stays unregistered and its header is marked disabled.
    fn register(&self) -> Result<()>;

    /// Stop the subscription; no-op when not registered
    fn unregister(&self);

    /// Format and submit one raw event
    fn on_event(&self, event: RawEvent);

    /// Current header block
    fn header(&self) -> Vec<LogEntry>;

    fn status(&self) -> AdapterStatusSnapshot;
}

/// Parts shared with the platform callback
struct AdapterCore {
    tag: Tag,
    kind: SensorKind,
    sink: Arc<dyn RecordSink>,
    clock: Arc<dyn Clock>,
    state: AdapterState,
    fix_observer: Option<Arc<dyn FixObserver>>,
}

impl AdapterCore {
    fn handle(&self, event: RawEvent) {
        if !self.state.is_registered() {
            trace!(tag = %self.tag, "event ignored, adapter not registered");
            return;
        }

        let arrival = ArrivalStamp {
            utc_millis: self.clock.utc_millis(),
            elapsed_realtime_nanos: self.clock.elapsed_realtime_nanos(),
        };

        let records = match format_event(&self.tag, &self.kind, &event, arrival) {
            Ok(records) => records,
            Err(err) => {
                self.state.record_mismatch();
                warn!(tag = %self.tag, error = %err, "dropping mismatched event");
                return;
            }
        };

        let count = records.len();
        trace!(tag = %self.tag, records = count, "event formatted");

        // counters only move once the sink has taken the records
        if count == 0 {
            self.state.record_event(0);
        } else {
            let entries = records.into_iter().map(LogEntry::Record).collect();
            match self.sink.submit_all(entries) {
                Ok(()) => {
                    self.state.record_event(count);
                    metrics::counter!("sensor_logger_records_submitted_total", "tag" => self.tag.to_string())
                        .increment(count as u64);
                }
                Err(err) => {
                    self.state.record_rejected(count);
                    trace!(tag = %self.tag, error = %err, "records rejected by sink");
                }
            }
        }

        if let (Some(observer), RawEvent::Location(fix)) = (&self.fix_observer, &event) {
            observer.on_fix(fix);
        }
    }
}

/// Adapter backed by a `SensorPlatform` subscription
pub struct PlatformAdapter {
    core: Arc<AdapterCore>,
    source: AdapterSource,
    sampling_period_us: u64,
    platform: Arc<dyn SensorPlatform>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl PlatformAdapter {
    /// Create an adapter; availability is decided here and never again
    pub fn new(
        config: &AdapterConfig,
        platform: Arc<dyn SensorPlatform>,
        sink: Arc<dyn RecordSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let source = AdapterSource::resolve(config, platform.as_ref());
        let available = source.is_available();
        let tag = config.effective_tag();
        debug!(tag = %tag, kind = %config.kind, available, "adapter created");

        Self {
            core: Arc::new(AdapterCore {
                tag,
                kind: config.kind.clone(),
                sink,
                clock,
                state: AdapterState::new(available),
                fix_observer: None,
            }),
            source,
            sampling_period_us: config.effective_sampling_period_us(),
            platform,
            subscription: Mutex::new(None),
        }
    }

    /// Attach a location fix observer (only meaningful for location adapters)
    pub fn with_fix_observer(mut self, observer: Arc<dyn FixObserver>) -> Self {
        if let Some(core) = Arc::get_mut(&mut self.core) {
            core.fix_observer = Some(observer);
        }
        self
    }

    pub fn source(&self) -> &AdapterSource {
        &self.source
    }

    pub fn sampling_period_us(&self) -> u64 {
        self.sampling_period_us
    }

    fn subscribe(&self) -> Result<SubscriptionId> {
        let request = self
            .source
            .request(self.sampling_period_us)
            .ok_or_else(|| {
                RegistrationError::capability_absent(
                    self.core.tag.as_str(),
                    self.source.missing_capability(),
                )
            })?;

        let core = self.core.clone();
        let callback: RawEventCallback = Arc::new(move |event| core.handle(event));

        self.platform
            .subscribe(request, callback)
            .map_err(|err| RegistrationError::from_platform(self.core.tag.as_str(), err))
    }

    fn submit_header(&self, entries: Vec<LogEntry>) {
        if let Err(err) = self.core.sink.submit_all(entries) {
            warn!(tag = %self.core.tag, error = %err, "header rejected by sink");
        }
    }
}

impl SensorAdapter for PlatformAdapter {
    fn tag(&self) -> &Tag {
        &self.core.tag
    }

    fn kind(&self) -> &SensorKind {
        &self.core.kind
    }

    fn is_available(&self) -> bool {
        self.core.state.is_available()
    }

    fn is_registered(&self) -> bool {
        self.core.state.is_registered()
    }

    #[instrument(name = "adapter_register", skip(self), fields(tag = %self.core.tag))]
    fn register(&self) -> Result<()> {
        let mut subscription = self
            .subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.core.state.is_registered() {
            return Ok(());
        }

        match self.subscribe() {
            Ok(id) => {
                *subscription = Some(id);
                self.core.state.set_last_error(None);
                let summary = self.source.summary(self.platform.as_ref());
                // header goes out before any record can be accepted
                self.submit_header(enabled_header(
                    &self.core.tag,
                    &self.core.kind,
                    self.sampling_period_us,
                    &summary,
                ));
                self.core.state.set_registered(true);
                metrics::counter!(
                    "sensor_logger_registrations_total",
                    "tag" => self.core.tag.to_string(),
                    "outcome" => "registered"
                )
                .increment(1);
                info!(tag = %self.core.tag, subscription = %id, "adapter registered");
                Ok(())
            }
            Err(err) => {
                self.core.state.set_last_error(Some(err.clone()));
                self.submit_header(vec![disabled_header(&self.core.tag)]);
                metrics::counter!(
                    "sensor_logger_registrations_total",
                    "tag" => self.core.tag.to_string(),
                    "outcome" => err.label()
                )
                .increment(1);
                warn!(tag = %self.core.tag, error = %err, "adapter registration failed");
                Err(err)
            }
        }
    }

    #[instrument(name = "adapter_unregister", skip(self), fields(tag = %self.core.tag))]
    fn unregister(&self) {
        let mut subscription = self
            .subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !self.core.state.set_registered(false) {
            return;
        }
        if let Some(id) = subscription.take() {
            self.platform.unsubscribe(id);
        }
        debug!(tag = %self.core.tag, events = self.core.state.event_count(), "adapter unregistered");
    }

    fn on_event(&self, event: RawEvent) {
        self.core.handle(event);
    }

    fn header(&self) -> Vec<LogEntry> {
        if self.is_registered() {
            enabled_header(
                &self.core.tag,
                &self.core.kind,
                self.sampling_period_us,
                &self.source.summary(self.platform.as_ref()),
            )
        } else {
            vec![disabled_header(&self.core.tag)]
        }
    }

    fn status(&self) -> AdapterStatusSnapshot {
        let snapshot = self.core.state.snapshot(&self.core.tag, &self.core.kind);
        match &self.source {
            AdapterSource::Location { provider, .. } => snapshot.with_provider(provider.as_str()),
            _ => snapshot,
        }
    }
}

/// Build one adapter per configured source
///
/// Location adapters get `fix_observer` when one is given.
pub fn build_adapters(
    configs: &[AdapterConfig],
    platform: Arc<dyn SensorPlatform>,
    sink: Arc<dyn RecordSink>,
    clock: Arc<dyn Clock>,
    fix_observer: Option<Arc<dyn FixObserver>>,
) -> Vec<Arc<dyn SensorAdapter>> {
    configs
        .iter()
        .map(|config| {
            let adapter =
                PlatformAdapter::new(config, platform.clone(), sink.clone(), clock.clone());
            let adapter = match (&config.kind, &fix_observer) {
                (SensorKind::GnssLocation, Some(observer)) => {
                    adapter.with_fix_observer(observer.clone())
                }
                _ => adapter,
            };
            Arc::new(adapter) as Arc<dyn SensorAdapter>
        })
        .collect()
}
