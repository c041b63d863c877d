//! SimulatedDevice - a `SensorPlatform` backed by a `DeviceProfile`
//!
//! Each successful subscription gets its own generator thread (unless the
//! profile is manual), delivering synthetic events through the callback just
//! as a platform sensor service does from its own threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use contracts::{
    DeviceInfo, HardwareSensorType, PlatformError, PlatformFeature, RawEvent, RawEventCallback,
    SensorInfo, SensorPlatform, SubscriptionId, SubscriptionRequest,
};
use tracing::{debug, instrument, trace, warn};

use crate::profile::{required_permission, DeviceProfile};
use crate::registry::SubscriptionTable;
use crate::synth::{interval_for, synthesize};

/// Longest uninterrupted sleep of a generator, so unsubscribe returns quickly
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Simulated phone
pub struct SimulatedDevice {
    profile: DeviceProfile,
    boot: Instant,
    table: SubscriptionTable,
}

impl SimulatedDevice {
    pub fn new(profile: DeviceProfile) -> Self {
        Self {
            profile,
            boot: Instant::now(),
            table: SubscriptionTable::new(),
        }
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Deliver `event` to matching subscriptions on the caller's thread
    ///
    /// Returns the number of callbacks invoked.
    pub fn emit(&self, event: RawEvent) -> usize {
        let delivered = self.table.dispatch(&event);
        trace!(event = event.name(), delivered, "event emitted");
        delivered
    }

    pub fn active_subscriptions(&self) -> usize {
        self.table.active_count()
    }

    pub fn active_requests(&self) -> Vec<SubscriptionRequest> {
        self.table.requests()
    }

    pub fn subscribe_calls(&self) -> u64 {
        self.table.subscribe_calls()
    }

    pub fn unsubscribe_calls(&self) -> u64 {
        self.table.unsubscribe_calls()
    }

    fn spawn_generator(&self, id: SubscriptionId, request: SubscriptionRequest, callback: RawEventCallback) {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let boot = self.boot;
        let interval = interval_for(&request);

        let spawned = thread::Builder::new()
            .name(format!("sim-{}", request.category()))
            .spawn(move || {
                debug!(id = %id, category = request.category(), ?interval, "generator started");
                let mut seq: u64 = 0;
                let mut next = Instant::now();

                while flag.load(Ordering::Relaxed) {
                    let elapsed = i64::try_from(boot.elapsed().as_nanos()).unwrap_or(i64::MAX);
                    callback(synthesize(&request, seq, elapsed));
                    seq += 1;

                    next += interval;
                    while flag.load(Ordering::Relaxed) {
                        let now = Instant::now();
                        if now >= next {
                            break;
                        }
                        thread::sleep((next - now).min(SLEEP_SLICE));
                    }
                }
                debug!(id = %id, events = seq, "generator stopped");
            });

        match spawned {
            Ok(handle) => self.table.attach_producer(id, running, handle),
            Err(e) => warn!(id = %id, error = %e, "could not start generator thread"),
        }
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new(DeviceProfile::typical_phone())
    }
}

impl SensorPlatform for SimulatedDevice {
    fn sensor_list(&self, filter: Option<HardwareSensorType>) -> Vec<SensorInfo> {
        self.profile
            .sensors
            .iter()
            .filter(|s| filter.map_or(true, |ty| s.sensor_type == ty))
            .cloned()
            .collect()
    }

    fn has_feature(&self, feature: PlatformFeature) -> bool {
        self.profile.has_feature(feature)
    }

    fn location_providers(&self) -> Vec<String> {
        self.profile.location_providers.clone()
    }

    fn gnss_hardware_model(&self) -> Option<String> {
        self.profile.gnss_hardware_model.clone()
    }

    fn device_info(&self) -> DeviceInfo {
        self.profile.device.clone()
    }

    #[instrument(name = "sim_subscribe", skip(self, request, callback), fields(category = request.category()))]
    fn subscribe(
        &self,
        request: SubscriptionRequest,
        callback: RawEventCallback,
    ) -> Result<SubscriptionId, PlatformError> {
        self.table.note_subscribe_call();

        if let Some(permission) = required_permission(&request) {
            if self.profile.denied_permissions.contains(permission) {
                return Err(PlatformError::permission_denied(permission));
            }
        }
        if !self.profile.supports(&request) {
            return Err(PlatformError::Unsupported {
                what: request.category().to_string(),
            });
        }
        if self.profile.failing_categories.contains(request.category()) {
            return Err(PlatformError::failed(format!(
                "{} service unavailable",
                request.category()
            )));
        }

        let id = self.table.insert(request.clone(), Arc::clone(&callback));
        if self.profile.generate {
            self.spawn_generator(id, request, callback);
        }
        debug!(id = %id, "subscribed");
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if self.table.remove(id) {
            debug!(id = %id, "unsubscribed");
        }
    }
}
