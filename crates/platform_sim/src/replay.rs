//! ReplayPlatform - plays back recorded raw events
//!
//! Input is JSONL, one `{"offset_ms": <u64>, "event": <RawEvent>}` object per
//! line. The device capabilities are derived from what the recording holds.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{
    DeviceInfo, HardwareSensorType, PlatformError, PlatformFeature, RawEvent, RawEventCallback,
    SensorInfo, SensorPlatform, SubscriptionId, SubscriptionRequest,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{Result, SimError};
use crate::registry::SubscriptionTable;

/// One line of a replay file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayEntry {
    /// Delay from the start of the recording (ms)
    pub offset_ms: u64,
    pub event: RawEvent,
}

/// Playback settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayConfig {
    /// Playback speed (1.0 = recorded pace, 0 or less = no delays)
    pub speed_multiplier: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
        }
    }
}

/// Parse replay entries from JSONL text; blank lines are skipped
pub fn parse_entries(reader: impl BufRead) -> Result<Vec<ReplayEntry>> {
    let mut entries = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| SimError::replay_parse(index + 1, e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: ReplayEntry = serde_json::from_str(&line)
            .map_err(|e| SimError::replay_parse(index + 1, e.to_string()))?;
        entries.push(entry);
    }
    // stable: equal offsets keep file order
    entries.sort_by_key(|entry| entry.offset_ms);
    Ok(entries)
}

/// Platform replaying a recording
pub struct ReplayPlatform {
    name: String,
    entries: Arc<Vec<ReplayEntry>>,
    sensors: Vec<SensorInfo>,
    features: BTreeSet<PlatformFeature>,
    providers: Vec<String>,
    config: ReplayConfig,
    table: Arc<SubscriptionTable>,
}

impl ReplayPlatform {
    /// Load a replay file
    pub fn load(path: &Path, config: ReplayConfig) -> Result<Self> {
        let file = File::open(path).map_err(|e| SimError::replay_read(path.display().to_string(), e))?;
        let entries = parse_entries(BufReader::new(file))?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "replay".to_string());

        info!(path = %path.display(), entries = entries.len(), "Loaded replay file");
        Ok(Self::from_entries(name, entries, config))
    }

    pub fn from_entries(name: impl Into<String>, entries: Vec<ReplayEntry>, config: ReplayConfig) -> Self {
        let mut sensors: Vec<SensorInfo> = Vec::new();
        let mut features = BTreeSet::new();
        let mut providers: Vec<String> = Vec::new();

        for entry in &entries {
            match &entry.event {
                RawEvent::Sensor(event) => {
                    let name = if event.sensor_name.is_empty() {
                        format!("Replay {:?}", event.sensor_type)
                    } else {
                        event.sensor_name.clone()
                    };
                    if !sensors.iter().any(|s| s.sensor_type == event.sensor_type && s.name == name) {
                        sensors.push(replay_sensor(name, event.sensor_type));
                    }
                }
                RawEvent::Location(fix) => {
                    features.insert(PlatformFeature::Gnss);
                    if !providers.contains(&fix.provider) {
                        providers.push(fix.provider.clone());
                    }
                }
                RawEvent::GnssMeasurements(_) => {
                    features.insert(PlatformFeature::GnssMeasurements);
                }
                RawEvent::NavigationMessage(_) => {
                    features.insert(PlatformFeature::GnssNavigationMessages);
                }
                RawEvent::BleScan(_) => {
                    features.insert(PlatformFeature::BluetoothLe);
                }
            }
        }

        Self {
            name: name.into(),
            entries: Arc::new(entries),
            sensors,
            features,
            providers,
            config,
            table: Arc::new(SubscriptionTable::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start delivering the recording to current and future subscriptions
    #[instrument(name = "replay_play", skip(self), fields(replay = %self.name))]
    pub fn play(&self) -> ReplayHandle {
        let entries = Arc::clone(&self.entries);
        let table = Arc::clone(&self.table);
        let speed = self.config.speed_multiplier;
        let stop = Arc::new(AtomicBool::new(false));
        let delivered = Arc::new(AtomicU64::new(0));

        let thread_stop = Arc::clone(&stop);
        let thread_delivered = Arc::clone(&delivered);
        let thread = thread::spawn(move || {
            let start = Instant::now();
            for entry in entries.iter() {
                if thread_stop.load(Ordering::Relaxed) {
                    debug!("Replay stopped");
                    return;
                }
                if speed > 0.0 {
                    let target = Duration::from_secs_f64(entry.offset_ms as f64 / 1000.0 / speed);
                    let elapsed = start.elapsed();
                    if target > elapsed {
                        thread::sleep(target - elapsed);
                    }
                }
                let n = table.dispatch(&entry.event);
                thread_delivered.fetch_add(n as u64, Ordering::Relaxed);
            }
            info!(entries = entries.len(), "Replay completed");
        });

        ReplayHandle {
            stop,
            delivered,
            thread: Some(thread),
        }
    }
}

fn replay_sensor(name: String, sensor_type: HardwareSensorType) -> SensorInfo {
    SensorInfo {
        name,
        vendor: "replay".to_string(),
        version: 1,
        sensor_type,
        max_range: 0.0,
        resolution: 0.0,
        power_ma: 0.0,
        min_delay_us: 0,
    }
}

impl SensorPlatform for ReplayPlatform {
    fn sensor_list(&self, filter: Option<HardwareSensorType>) -> Vec<SensorInfo> {
        self.sensors
            .iter()
            .filter(|s| filter.map_or(true, |ty| s.sensor_type == ty))
            .cloned()
            .collect()
    }

    fn has_feature(&self, feature: PlatformFeature) -> bool {
        self.features.contains(&feature)
    }

    fn location_providers(&self) -> Vec<String> {
        self.providers.clone()
    }

    fn gnss_hardware_model(&self) -> Option<String> {
        Some(format!("replay:{}", self.name))
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            platform_release: "replay".to_string(),
            manufacturer: "replay".to_string(),
            model: self.name.clone(),
        }
    }

    fn subscribe(
        &self,
        request: SubscriptionRequest,
        callback: RawEventCallback,
    ) -> std::result::Result<SubscriptionId, PlatformError> {
        self.table.note_subscribe_call();
        Ok(self.table.insert(request, callback))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.table.remove(id);
    }
}

/// Running playback
pub struct ReplayHandle {
    stop: Arc<AtomicBool>,
    delivered: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl ReplayHandle {
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Callback invocations so far
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Wait for the end of the recording
    pub fn join(mut self) -> u64 {
        self.join_inner();
        self.delivered()
    }

    /// Stop early and wait for the playback thread
    pub fn stop(mut self) -> u64 {
        self.stop.store(true, Ordering::SeqCst);
        self.join_inner();
        self.delivered()
    }

    fn join_inner(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ReplayHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.join_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    const RECORDING: &str = r#"{"offset_ms":20,"event":{"location":{"provider":"gps","latitude":60.1,"longitude":24.9,"time_millis":1700000000000,"elapsed_realtime_nanos":5}}}
{"offset_ms":0,"event":{"sensor":{"sensor_type":"pressure","sensor_name":"LPS22H","timestamp_nanos":1,"values":[1013.25],"accuracy":3}}}

{"offset_ms":10,"event":{"sensor":{"sensor_type":"pressure","sensor_name":"LPS22H","timestamp_nanos":2,"values":[1013.5],"accuracy":3}}}
"#;

    #[test]
    fn entries_are_sorted_by_offset() {
        let entries = parse_entries(RECORDING.as_bytes()).unwrap();
        let offsets: Vec<u64> = entries.iter().map(|e| e.offset_ms).collect();
        assert_eq!(offsets, vec![0, 10, 20]);
    }

    #[test]
    fn bad_line_reports_its_number() {
        let err = parse_entries("{\"offset_ms\":0}\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SimError::ReplayParse { line: 1, .. }));
    }

    #[test]
    fn capabilities_come_from_the_recording() {
        let platform = ReplayPlatform::from_entries(
            "walk",
            parse_entries(RECORDING.as_bytes()).unwrap(),
            ReplayConfig::default(),
        );
        assert_eq!(platform.sensor_list(None).len(), 1);
        assert_eq!(platform.default_sensor(HardwareSensorType::Pressure).unwrap().name, "LPS22H");
        assert_eq!(platform.location_providers(), vec!["gps".to_string()]);
        assert!(!platform.has_feature(PlatformFeature::BluetoothLe));
        assert_eq!(platform.device_info().model, "walk");
    }

    #[test]
    fn playback_delivers_to_subscribers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RECORDING.as_bytes()).unwrap();
        let platform = ReplayPlatform::load(file.path(), ReplayConfig { speed_multiplier: 0.0 }).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sensor = platform.default_sensor(HardwareSensorType::Pressure).unwrap();
        platform
            .subscribe(
                SubscriptionRequest::Sensor {
                    sensor,
                    sampling_period_us: 0,
                },
                Arc::new(move |event| sink.lock().unwrap().push(event)),
            )
            .unwrap();

        let delivered = platform.play().join();
        assert_eq!(delivered, 2);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }
}
