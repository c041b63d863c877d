//! SensorPlatform trait - device capability and subscription surface
//!
//! Everything the core needs from the operating system: which sensors exist,
//! which radios are present, and a subscription call per event category.
//! Implementations deliver events on their own threads through the callback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::{HardwareSensorType, RawEvent};

/// Raw event callback
///
/// Invoked from platform-owned threads; must return quickly.
pub type RawEventCallback = Arc<dyn Fn(RawEvent) + Send + Sync>;

/// Static description of one hardware sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorInfo {
    pub name: String,
    pub vendor: String,
    #[serde(default)]
    pub version: i32,
    pub sensor_type: HardwareSensorType,
    #[serde(default)]
    pub max_range: f32,
    #[serde(default)]
    pub resolution: f32,
    #[serde(default)]
    pub power_ma: f32,
    /// Minimum delay between two events (us), 0 for on-change sensors
    #[serde(default)]
    pub min_delay_us: i32,
}

impl SensorInfo {
    /// Human readable summary used in the header line
    pub fn summary(&self) -> String {
        format!(
            "{{Sensor name=\"{}\", vendor=\"{}\", version={}, type={}, maxRange={}, resolution={}, power={}, minDelay={}}}",
            self.name,
            self.vendor,
            self.version,
            self.sensor_type.code(),
            self.max_range,
            self.resolution,
            self.power_ma,
            self.min_delay_us
        )
    }
}

/// Optional radios / system features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformFeature {
    Gnss,
    GnssMeasurements,
    GnssNavigationMessages,
    BluetoothLe,
}

/// Device metadata written to the output preamble
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub app_version: String,
    pub platform_release: String,
    pub manufacturer: String,
    pub model: String,
}

/// Handle returned by a successful subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// One subscription per event category
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionRequest {
    Sensor {
        sensor: SensorInfo,
        sampling_period_us: u64,
    },
    Location {
        provider: String,
        min_interval_ms: u64,
    },
    GnssMeasurements,
    NavigationMessages,
    BluetoothScan,
}

impl SubscriptionRequest {
    /// Whether `event` is of the category this request delivers
    pub fn accepts(&self, event: &RawEvent) -> bool {
        match (self, event) {
            (Self::Sensor { sensor, .. }, RawEvent::Sensor(e)) => {
                e.sensor_type == sensor.sensor_type
                    && (e.sensor_name.is_empty() || e.sensor_name == sensor.name)
            }
            (Self::Location { provider, .. }, RawEvent::Location(fix)) => fix.provider == *provider,
            (Self::GnssMeasurements, RawEvent::GnssMeasurements(_)) => true,
            (Self::NavigationMessages, RawEvent::NavigationMessage(_)) => true,
            (Self::BluetoothScan, RawEvent::BleScan(_)) => true,
            _ => false,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Sensor { .. } => "sensor",
            Self::Location { .. } => "location",
            Self::GnssMeasurements => "gnss_measurements",
            Self::NavigationMessages => "navigation_messages",
            Self::BluetoothScan => "bluetooth_scan",
        }
    }
}

/// Errors raised by the platform subscription facility
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    #[error("permission denied: {permission}")]
    PermissionDenied { permission: String },

    #[error("unsupported subscription: {what}")]
    Unsupported { what: String },

    #[error("subscription failed: {message}")]
    Failed { message: String },
}

impl PlatformError {
    pub fn permission_denied(permission: impl Into<String>) -> Self {
        Self::PermissionDenied {
            permission: permission.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Device capability query and subscription facility
pub trait SensorPlatform: Send + Sync {
    /// Sensors of the given type, or every sensor when `filter` is `None`
    fn sensor_list(&self, filter: Option<HardwareSensorType>) -> Vec<SensorInfo>;

    /// Default sensor of a type
    fn default_sensor(&self, sensor_type: HardwareSensorType) -> Option<SensorInfo> {
        self.sensor_list(Some(sensor_type)).into_iter().next()
    }

    fn has_feature(&self, feature: PlatformFeature) -> bool;

    /// Names of the location providers present on the device
    fn location_providers(&self) -> Vec<String>;

    /// GNSS chipset model name, if the platform reports one
    fn gnss_hardware_model(&self) -> Option<String>;

    fn device_info(&self) -> DeviceInfo;

    /// Start delivering events of one category to `callback`
    ///
    /// # Errors
    /// `PermissionDenied` when the OS refuses access, `Unsupported` or
    /// `Failed` when the subscription cannot be made.
    fn subscribe(
        &self,
        request: SubscriptionRequest,
        callback: RawEventCallback,
    ) -> Result<SubscriptionId, PlatformError>;

    /// Stop a subscription; unknown ids are ignored
    fn unsubscribe(&self, id: SubscriptionId);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LocationFix, SensorEvent};

    fn accel() -> SensorInfo {
        SensorInfo {
            name: "BMI160 accelerometer".into(),
            vendor: "Bosch".into(),
            version: 1,
            sensor_type: HardwareSensorType::Accelerometer,
            max_range: 78.4,
            resolution: 0.0024,
            power_ma: 0.18,
            min_delay_us: 2500,
        }
    }

    #[test]
    fn sensor_request_matches_type_and_name() {
        let request = SubscriptionRequest::Sensor {
            sensor: accel(),
            sampling_period_us: 20_000,
        };
        let mut event = SensorEvent {
            sensor_type: HardwareSensorType::Accelerometer,
            sensor_name: "BMI160 accelerometer".into(),
            timestamp_nanos: 1,
            values: vec![0.0, 0.0, 9.8],
            accuracy: 3,
        };
        assert!(request.accepts(&RawEvent::Sensor(event.clone())));
        event.sensor_name = "other".into();
        assert!(!request.accepts(&RawEvent::Sensor(event)));
    }

    #[test]
    fn location_request_is_provider_specific() {
        let request = SubscriptionRequest::Location {
            provider: "gps".into(),
            min_interval_ms: 1000,
        };
        let fix = LocationFix {
            provider: "network".into(),
            latitude: 1.0,
            longitude: 2.0,
            altitude: None,
            speed: None,
            accuracy: None,
            bearing: None,
            time_millis: 0,
            speed_accuracy_mps: None,
            bearing_accuracy_deg: None,
            elapsed_realtime_nanos: 0,
            vertical_accuracy_m: None,
            elapsed_realtime_uncertainty_nanos: None,
        };
        assert!(!request.accepts(&RawEvent::Location(fix)));
    }

    #[test]
    fn summary_mentions_name_and_type_code() {
        let summary = accel().summary();
        assert!(summary.contains("name=\"BMI160 accelerometer\""));
        assert!(summary.contains("type=1"));
    }
}
