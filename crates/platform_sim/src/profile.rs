//! Device profiles - what a simulated device has and refuses

use std::collections::BTreeSet;

use contracts::{
    DeviceInfo, HardwareSensorType, PlatformFeature, SensorInfo, SubscriptionRequest,
};

/// Permission names checked by the simulated device
pub mod permissions {
    pub const FINE_LOCATION: &str = "ACCESS_FINE_LOCATION";
    pub const BODY_SENSORS: &str = "BODY_SENSORS";
    pub const ACTIVITY_RECOGNITION: &str = "ACTIVITY_RECOGNITION";
    pub const BLUETOOTH_SCAN: &str = "BLUETOOTH_SCAN";
}

/// Runtime permission a subscription needs, if any
pub fn required_permission(request: &SubscriptionRequest) -> Option<&'static str> {
    match request {
        SubscriptionRequest::Location { .. }
        | SubscriptionRequest::GnssMeasurements
        | SubscriptionRequest::NavigationMessages => Some(permissions::FINE_LOCATION),
        SubscriptionRequest::BluetoothScan => Some(permissions::BLUETOOTH_SCAN),
        SubscriptionRequest::Sensor { sensor, .. } => match sensor.sensor_type {
            HardwareSensorType::HeartRate => Some(permissions::BODY_SENSORS),
            HardwareSensorType::StepCounter | HardwareSensorType::StepDetector => {
                Some(permissions::ACTIVITY_RECOGNITION)
            }
            _ => None,
        },
    }
}

/// Capabilities and injected faults of a simulated device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub device: DeviceInfo,
    pub sensors: Vec<SensorInfo>,
    pub features: BTreeSet<PlatformFeature>,
    pub location_providers: Vec<String>,
    pub gnss_hardware_model: Option<String>,
    /// Permissions the user refused
    pub denied_permissions: BTreeSet<String>,
    /// Subscription categories (`SubscriptionRequest::category`) that fail
    pub failing_categories: BTreeSet<String>,
    /// Spawn a generator thread per subscription
    pub generate: bool,
}

fn sensor(name: &str, vendor: &str, sensor_type: HardwareSensorType, max_range: f32, min_delay_us: i32) -> SensorInfo {
    SensorInfo {
        name: name.to_string(),
        vendor: vendor.to_string(),
        version: 1,
        sensor_type,
        max_range,
        resolution: 0.001,
        power_ma: 0.5,
        min_delay_us,
    }
}

impl DeviceProfile {
    /// A phone with every sensor and radio the logger knows about
    pub fn typical_phone() -> Self {
        use HardwareSensorType as T;

        let sensors = vec![
            sensor("LSM6DSO Accelerometer", "STMicro", T::Accelerometer, 78.4532, 2404),
            sensor("LSM6DSO Gyroscope", "STMicro", T::Gyroscope, 34.906586, 2404),
            sensor("MMC56x3 Magnetometer", "memsic", T::MagneticField, 4912.0, 10000),
            sensor("LSM6DSO Accelerometer-Uncalibrated", "STMicro", T::AccelerometerUncalibrated, 78.4532, 2404),
            sensor("LSM6DSO Gyroscope-Uncalibrated", "STMicro", T::GyroscopeUncalibrated, 34.906586, 2404),
            sensor("MMC56x3 Magnetometer-Uncalibrated", "memsic", T::MagneticFieldUncalibrated, 4912.0, 10000),
            sensor("ICP10101 Pressure Sensor", "TDK", T::Pressure, 1150.0, 40000),
            sensor("Heart Rate Monitor", "Google", T::HeartRate, 300.0, 0),
            sensor("Step Counter", "Google", T::StepCounter, 4_294_967_296.0, 0),
            sensor("Step Detector", "Google", T::StepDetector, 1.0, 0),
            sensor("Device Orientation", "Google", T::Other, 3.0, 0),
        ];

        Self {
            device: DeviceInfo {
                app_version: env!("CARGO_PKG_VERSION").to_string(),
                platform_release: "14".to_string(),
                manufacturer: "Google".to_string(),
                model: "Pixel 8".to_string(),
            },
            sensors,
            features: [
                PlatformFeature::Gnss,
                PlatformFeature::GnssMeasurements,
                PlatformFeature::GnssNavigationMessages,
                PlatformFeature::BluetoothLe,
            ]
            .into_iter()
            .collect(),
            location_providers: vec!["gps".to_string(), "network".to_string()],
            gnss_hardware_model: Some("BCM4775".to_string()),
            denied_permissions: BTreeSet::new(),
            failing_categories: BTreeSet::new(),
            generate: true,
        }
    }

    /// A device with nothing but an accelerometer
    pub fn bare() -> Self {
        let mut profile = Self::typical_phone();
        profile.sensors.retain(|s| s.sensor_type == HardwareSensorType::Accelerometer);
        profile.features.clear();
        profile.location_providers.clear();
        profile.gnss_hardware_model = None;
        profile
    }

    pub fn without_sensor(mut self, sensor_type: HardwareSensorType) -> Self {
        self.sensors.retain(|s| s.sensor_type != sensor_type);
        self
    }

    pub fn with_sensor(mut self, sensor: SensorInfo) -> Self {
        self.sensors.push(sensor);
        self
    }

    pub fn without_feature(mut self, feature: PlatformFeature) -> Self {
        self.features.remove(&feature);
        self
    }

    pub fn without_provider(mut self, provider: &str) -> Self {
        self.location_providers.retain(|p| p != provider);
        self
    }

    pub fn deny_permission(mut self, permission: &str) -> Self {
        self.denied_permissions.insert(permission.to_string());
        self
    }

    pub fn fail_subscriptions(mut self, category: &str) -> Self {
        self.failing_categories.insert(category.to_string());
        self
    }

    /// Only deliver events passed to `emit`
    pub fn manual(mut self) -> Self {
        self.generate = false;
        self
    }

    pub fn has_feature(&self, feature: PlatformFeature) -> bool {
        self.features.contains(&feature)
    }

    /// Whether the device can serve `request` at all
    pub fn supports(&self, request: &SubscriptionRequest) -> bool {
        match request {
            SubscriptionRequest::Sensor { sensor, .. } => self.sensors.iter().any(|s| s == sensor),
            SubscriptionRequest::Location { provider, .. } => {
                self.location_providers.iter().any(|p| p == provider)
            }
            SubscriptionRequest::GnssMeasurements => self.has_feature(PlatformFeature::GnssMeasurements),
            SubscriptionRequest::NavigationMessages => {
                self.has_feature(PlatformFeature::GnssNavigationMessages)
            }
            SubscriptionRequest::BluetoothScan => self.has_feature(PlatformFeature::BluetoothLe),
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::typical_phone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typical_phone_has_one_sensor_per_type() {
        let profile = DeviceProfile::typical_phone();
        for ty in [
            HardwareSensorType::Accelerometer,
            HardwareSensorType::Pressure,
            HardwareSensorType::StepDetector,
        ] {
            assert_eq!(profile.sensors.iter().filter(|s| s.sensor_type == ty).count(), 1);
        }
        assert!(profile.has_feature(PlatformFeature::BluetoothLe));
    }

    #[test]
    fn builders_remove_capabilities() {
        let profile = DeviceProfile::typical_phone()
            .without_feature(PlatformFeature::GnssMeasurements)
            .without_provider("network");
        assert!(!profile.supports(&SubscriptionRequest::GnssMeasurements));
        assert!(!profile.supports(&SubscriptionRequest::Location {
            provider: "network".into(),
            min_interval_ms: 1000,
        }));
        assert!(profile.supports(&SubscriptionRequest::NavigationMessages));
    }

    #[test]
    fn heart_rate_needs_body_sensors() {
        let profile = DeviceProfile::typical_phone();
        let hr = profile
            .sensors
            .iter()
            .find(|s| s.sensor_type == HardwareSensorType::HeartRate)
            .cloned()
            .unwrap();
        let request = SubscriptionRequest::Sensor {
            sensor: hr,
            sampling_period_us: 1_000_000,
        };
        assert_eq!(required_permission(&request), Some(permissions::BODY_SENSORS));
        assert_eq!(required_permission(&SubscriptionRequest::BluetoothScan), Some(permissions::BLUETOOTH_SCAN));
    }
}
