//! SessionBlueprint - Config Loader output
//!
//! Describes one logging session: where the output goes, which sensors are
//! monitored, and the optional location telemetry observer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{SensorKind, Tag};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Output settings
    #[serde(default)]
    pub session: SessionSettings,

    /// One entry per adapter, in header order
    pub sensors: Vec<AdapterConfig>,

    /// Optional location telemetry
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Directory receiving `<prefix>_<yyyyMMdd_HHmmss>.csv`
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Number of recently written lines kept for status display
    #[serde(default = "default_recent_capacity")]
    pub recent_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
            recent_capacity: default_recent_capacity(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_file_prefix() -> String {
    "log_mobile".to_string()
}

fn default_recent_capacity() -> usize {
    64
}

fn default_enabled() -> bool {
    true
}

/// One monitored source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub kind: SensorKind,

    /// Tag override; defaults to the kind's tag
    #[serde(default)]
    pub tag: Option<String>,

    /// Sampling period request (us); defaults per kind
    #[serde(default)]
    pub sampling_period_us: Option<u64>,

    /// Location provider name, required for `gnss_location`
    #[serde(default)]
    pub provider: Option<String>,

    /// Disabled entries only produce a disabled header
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl AdapterConfig {
    pub fn new(kind: SensorKind) -> Self {
        Self {
            kind,
            tag: None,
            sampling_period_us: None,
            provider: None,
            enabled: true,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_sampling_period_us(mut self, period_us: u64) -> Self {
        self.sampling_period_us = Some(period_us);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn effective_tag(&self) -> Tag {
        match &self.tag {
            Some(tag) => Tag::new(tag),
            None => Tag::new(self.kind.default_tag()),
        }
    }

    pub fn effective_sampling_period_us(&self) -> u64 {
        self.sampling_period_us
            .unwrap_or_else(|| self.kind.default_sampling_period_us())
    }
}

/// Location telemetry observer (UDP JSON datagrams)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Target `host:port`
    pub addr: String,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default)]
    pub drop_policy: DropPolicy,
}

fn default_queue_capacity() -> usize {
    32
}

/// Drop policy when a bounded queue is full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Drop the oldest queued item
    #[default]
    DropOldest,
    /// Drop the new item
    DropNewest,
}

impl SessionBlueprint {
    /// Standard sensor set of a phone logging session
    pub fn default_android() -> Self {
        let mut sensors: Vec<AdapterConfig> = [
            SensorKind::Accelerometer,
            SensorKind::Gyroscope,
            SensorKind::MagneticField,
            SensorKind::AccelerometerUncalibrated,
            SensorKind::GyroscopeUncalibrated,
            SensorKind::MagneticFieldUncalibrated,
            SensorKind::Pressure,
        ]
        .into_iter()
        .map(AdapterConfig::new)
        .collect();

        sensors.push(AdapterConfig::new(SensorKind::GnssLocation).with_provider("gps"));
        sensors.push(AdapterConfig::new(SensorKind::GnssLocation).with_provider("network"));
        sensors.extend(
            [
                SensorKind::GnssRawMeasurement,
                SensorKind::GnssNavigationMessage,
                SensorKind::Bluetooth,
                SensorKind::HeartRate,
                SensorKind::StepCounter,
                SensorKind::StepDetector,
            ]
            .into_iter()
            .map(AdapterConfig::new),
        );

        Self {
            version: ConfigVersion::V1,
            session: SessionSettings::default(),
            sensors,
            telemetry: None,
        }
    }

    /// Configs that will actually try to register
    pub fn enabled_sensors(&self) -> impl Iterator<Item = &AdapterConfig> {
        self.sensors.iter().filter(|s| s.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_android_locations_share_the_fix_tag() {
        let blueprint = SessionBlueprint::default_android();
        assert_eq!(blueprint.sensors.len(), 15);

        let fixes: Vec<_> = blueprint
            .sensors
            .iter()
            .filter(|s| s.kind == SensorKind::GnssLocation)
            .collect();
        assert_eq!(fixes.len(), 2);
        assert!(fixes.iter().all(|s| s.effective_tag() == "Fix"));
        assert_ne!(fixes[0].provider, fixes[1].provider);
    }

    #[test]
    fn effective_values_fall_back_to_kind_defaults() {
        let config = AdapterConfig::new(SensorKind::HeartRate);
        assert_eq!(config.effective_tag(), "HR");
        assert_eq!(config.effective_sampling_period_us(), 1_000_000);

        let config = AdapterConfig::new(SensorKind::Pressure)
            .with_tag("BARO")
            .with_sampling_period_us(100_000);
        assert_eq!(config.effective_tag(), "BARO");
        assert_eq!(config.effective_sampling_period_us(), 100_000);
    }

    #[test]
    fn enabled_defaults_to_true_when_deserialized() {
        let config: AdapterConfig = serde_json::from_str(r#"{"kind":"pressure"}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.tag, None);
    }
}
