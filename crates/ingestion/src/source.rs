//! Adapter source variants
//!
//! The closed set of event sources an adapter can wrap. A variant decides
//! availability, the subscription request and the header summary; nothing
//! else differs between adapters.

use contracts::{
    AdapterConfig, PlatformFeature, SensorInfo, SensorKind, SensorPlatform, SubscriptionRequest,
};

/// Event source behind one adapter, resolved once at construction
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterSource {
    /// Polled hardware sensor; `None` when the device has no matching sensor
    Polled { sensor: Option<SensorInfo> },

    /// Location fixes of one named provider
    Location { provider: String, present: bool },

    GnssMeasurements { present: bool },

    NavigationMessages { present: bool },

    Bluetooth { present: bool },
}

impl AdapterSource {
    /// Query the platform capability surface for `config`
    pub fn resolve(config: &AdapterConfig, platform: &dyn SensorPlatform) -> Self {
        match &config.kind {
            SensorKind::NamedGeneric(name) => Self::Polled {
                sensor: platform
                    .sensor_list(None)
                    .into_iter()
                    .find(|sensor| sensor.name == *name),
            },
            SensorKind::GnssLocation => {
                let provider = config.provider.clone().unwrap_or_default();
                let present = !provider.is_empty()
                    && platform.location_providers().iter().any(|p| *p == provider);
                Self::Location { provider, present }
            }
            SensorKind::GnssRawMeasurement => Self::GnssMeasurements {
                present: platform.has_feature(PlatformFeature::GnssMeasurements),
            },
            SensorKind::GnssNavigationMessage => Self::NavigationMessages {
                present: platform.has_feature(PlatformFeature::GnssNavigationMessages),
            },
            SensorKind::Bluetooth => Self::Bluetooth {
                present: platform.has_feature(PlatformFeature::BluetoothLe),
            },
            kind => Self::Polled {
                sensor: kind
                    .hardware_type()
                    .and_then(|ty| platform.default_sensor(ty)),
            },
        }
    }

    pub fn is_available(&self) -> bool {
        match self {
            Self::Polled { sensor } => sensor.is_some(),
            Self::Location { present, .. }
            | Self::GnssMeasurements { present }
            | Self::NavigationMessages { present }
            | Self::Bluetooth { present } => *present,
        }
    }

    /// What is missing when unavailable
    pub fn missing_capability(&self) -> String {
        match self {
            Self::Polled { .. } => "no matching sensor".to_string(),
            Self::Location { provider, .. } => format!("location provider '{provider}'"),
            Self::GnssMeasurements { .. } => "GNSS raw measurements".to_string(),
            Self::NavigationMessages { .. } => "GNSS navigation messages".to_string(),
            Self::Bluetooth { .. } => "Bluetooth LE".to_string(),
        }
    }

    /// Subscription call made by `register`; `None` when unavailable
    pub fn request(&self, sampling_period_us: u64) -> Option<SubscriptionRequest> {
        if !self.is_available() {
            return None;
        }
        Some(match self {
            Self::Polled { sensor } => SubscriptionRequest::Sensor {
                sensor: sensor.clone()?,
                sampling_period_us,
            },
            Self::Location { provider, .. } => SubscriptionRequest::Location {
                provider: provider.clone(),
                min_interval_ms: sampling_period_us / 1000,
            },
            Self::GnssMeasurements { .. } => SubscriptionRequest::GnssMeasurements,
            Self::NavigationMessages { .. } => SubscriptionRequest::NavigationMessages,
            Self::Bluetooth { .. } => SubscriptionRequest::BluetoothScan,
        })
    }

    /// Human readable description for the enabled header
    pub fn summary(&self, platform: &dyn SensorPlatform) -> String {
        match self {
            Self::Polled { sensor: Some(sensor) } => sensor.summary(),
            Self::Polled { sensor: None } => "{}".to_string(),
            Self::Location { .. } | Self::GnssMeasurements { .. } | Self::NavigationMessages { .. } => {
                format!(
                    "{{Receiver: {}}}",
                    platform
                        .gnss_hardware_model()
                        .unwrap_or_else(|| "unknown".to_string())
                )
            }
            Self::Bluetooth { .. } => "{Bluetooth LE scanner}".to_string(),
        }
    }
}
