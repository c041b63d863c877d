//! SensorKind - closed set of loggable sources
//!
//! Every adapter is tagged with exactly one kind; the kind alone decides the
//! record schema and which platform subscription the adapter makes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hardware sensor types exposed by the platform sensor service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareSensorType {
    Accelerometer,
    Gyroscope,
    MagneticField,
    AccelerometerUncalibrated,
    GyroscopeUncalibrated,
    MagneticFieldUncalibrated,
    Pressure,
    HeartRate,
    StepCounter,
    StepDetector,
    /// Vendor specific or otherwise unclassified sensor
    Other,
}

impl HardwareSensorType {
    /// Platform type code (matches the Android `Sensor.TYPE_*` constants)
    pub fn code(self) -> i32 {
        match self {
            Self::Accelerometer => 1,
            Self::MagneticField => 2,
            Self::Gyroscope => 4,
            Self::Pressure => 6,
            Self::MagneticFieldUncalibrated => 14,
            Self::GyroscopeUncalibrated => 16,
            Self::StepDetector => 18,
            Self::StepCounter => 19,
            Self::HeartRate => 21,
            Self::AccelerometerUncalibrated => 35,
            Self::Other => -1,
        }
    }
}

/// Kind of a monitored source.
///
/// `NamedGeneric` selects one sensor by exact name match against the
/// platform's full sensor list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
    MagneticField,
    AccelerometerUncalibrated,
    GyroscopeUncalibrated,
    MagneticFieldUncalibrated,
    Pressure,
    GnssLocation,
    GnssRawMeasurement,
    GnssNavigationMessage,
    Bluetooth,
    HeartRate,
    StepCounter,
    StepDetector,
    NamedGeneric(String),
}

impl SensorKind {
    /// All kinds with a fixed identity (everything except `NamedGeneric`)
    pub const BUILTIN: [SensorKind; 14] = [
        SensorKind::Accelerometer,
        SensorKind::Gyroscope,
        SensorKind::MagneticField,
        SensorKind::AccelerometerUncalibrated,
        SensorKind::GyroscopeUncalibrated,
        SensorKind::MagneticFieldUncalibrated,
        SensorKind::Pressure,
        SensorKind::GnssLocation,
        SensorKind::GnssRawMeasurement,
        SensorKind::GnssNavigationMessage,
        SensorKind::Bluetooth,
        SensorKind::HeartRate,
        SensorKind::StepCounter,
        SensorKind::StepDetector,
    ];

    /// Hardware sensor type backing this kind, if it is a polled sensor.
    ///
    /// `NamedGeneric` returns `None`: its type is whatever the matched sensor reports.
    pub fn hardware_type(&self) -> Option<HardwareSensorType> {
        match self {
            Self::Accelerometer => Some(HardwareSensorType::Accelerometer),
            Self::Gyroscope => Some(HardwareSensorType::Gyroscope),
            Self::MagneticField => Some(HardwareSensorType::MagneticField),
            Self::AccelerometerUncalibrated => Some(HardwareSensorType::AccelerometerUncalibrated),
            Self::GyroscopeUncalibrated => Some(HardwareSensorType::GyroscopeUncalibrated),
            Self::MagneticFieldUncalibrated => Some(HardwareSensorType::MagneticFieldUncalibrated),
            Self::Pressure => Some(HardwareSensorType::Pressure),
            Self::HeartRate => Some(HardwareSensorType::HeartRate),
            Self::StepCounter => Some(HardwareSensorType::StepCounter),
            Self::StepDetector => Some(HardwareSensorType::StepDetector),
            Self::GnssLocation
            | Self::GnssRawMeasurement
            | Self::GnssNavigationMessage
            | Self::Bluetooth
            | Self::NamedGeneric(_) => None,
        }
    }

    /// Tag used when the configuration does not override it
    pub fn default_tag(&self) -> &'static str {
        match self {
            Self::Accelerometer => "ACC",
            Self::Gyroscope => "GYRO",
            Self::MagneticField => "MAG",
            Self::AccelerometerUncalibrated => "ACC_UNCAL",
            Self::GyroscopeUncalibrated => "GYRO_UNCAL",
            Self::MagneticFieldUncalibrated => "MAG_UNCAL",
            Self::Pressure => "PSR",
            Self::GnssLocation => "Fix",
            Self::GnssRawMeasurement => "Raw",
            Self::GnssNavigationMessage => "Nav",
            Self::Bluetooth => "BLE",
            Self::HeartRate => "HR",
            Self::StepCounter => "STEP_COUNT",
            Self::StepDetector => "STEP_DETECT",
            Self::NamedGeneric(_) => "NAMED",
        }
    }

    /// Default sampling period request in microseconds (0 = event driven)
    pub fn default_sampling_period_us(&self) -> u64 {
        match self {
            Self::HeartRate | Self::GnssLocation | Self::GnssRawMeasurement => 1_000_000,
            Self::GnssNavigationMessage | Self::Bluetooth => 0,
            _ => 20_000,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedGeneric(name) => write!(f, "named({name})"),
            other => write!(f, "{:?}", other),
        }
    }
}
