//! Raw events delivered by platform subscriptions
//!
//! Values are carried verbatim; optional fields are `None` when the platform
//! marks them as not present.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::HardwareSensorType;

/// Polled hardware sensor sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEvent {
    /// Type reported by the producing sensor
    pub sensor_type: HardwareSensorType,

    /// Name of the producing sensor
    #[serde(default)]
    pub sensor_name: String,

    /// Boot-relative timestamp (ns)
    pub timestamp_nanos: i64,

    /// Raw values, layout depends on the sensor type
    pub values: Vec<f32>,

    /// Accuracy status code
    #[serde(default)]
    pub accuracy: i32,
}

/// Location fix from a named provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub provider: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub speed: Option<f32>,
    #[serde(default)]
    pub accuracy: Option<f32>,
    #[serde(default)]
    pub bearing: Option<f32>,
    /// UTC fix time (ms)
    pub time_millis: i64,
    #[serde(default)]
    pub speed_accuracy_mps: Option<f32>,
    #[serde(default)]
    pub bearing_accuracy_deg: Option<f32>,
    /// Boot-relative fix time (ns)
    pub elapsed_realtime_nanos: i64,
    #[serde(default)]
    pub vertical_accuracy_m: Option<f32>,
    #[serde(default)]
    pub elapsed_realtime_uncertainty_nanos: Option<f64>,
}

/// GNSS receiver clock snapshot shared by all measurements of one event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GnssClock {
    pub time_nanos: i64,
    #[serde(default)]
    pub leap_second: Option<i32>,
    #[serde(default)]
    pub time_uncertainty_nanos: Option<f64>,
    #[serde(default)]
    pub full_bias_nanos: Option<i64>,
    #[serde(default)]
    pub bias_nanos: Option<f64>,
    #[serde(default)]
    pub bias_uncertainty_nanos: Option<f64>,
    #[serde(default)]
    pub drift_nanos_per_second: Option<f64>,
    #[serde(default)]
    pub drift_uncertainty_nanos_per_second: Option<f64>,
    #[serde(default)]
    pub hardware_clock_discontinuity_count: i32,
    #[serde(default)]
    pub elapsed_realtime_nanos: Option<i64>,
}

/// One satellite signal measurement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GnssMeasurement {
    pub svid: i32,
    #[serde(default)]
    pub time_offset_nanos: f64,
    #[serde(default)]
    pub state: i32,
    #[serde(default)]
    pub received_sv_time_nanos: i64,
    #[serde(default)]
    pub received_sv_time_uncertainty_nanos: i64,
    pub cn0_db_hz: f64,
    #[serde(default)]
    pub pseudorange_rate_mps: f64,
    #[serde(default)]
    pub pseudorange_rate_uncertainty_mps: f64,
    #[serde(default)]
    pub accumulated_delta_range_state: i32,
    #[serde(default)]
    pub accumulated_delta_range_meters: f64,
    #[serde(default)]
    pub accumulated_delta_range_uncertainty_meters: f64,
    #[serde(default)]
    pub carrier_frequency_hz: Option<f32>,
    #[serde(default)]
    pub carrier_cycles: Option<i64>,
    #[serde(default)]
    pub carrier_phase: Option<f64>,
    #[serde(default)]
    pub carrier_phase_uncertainty: Option<f64>,
    #[serde(default)]
    pub multipath_indicator: i32,
    #[serde(default)]
    pub snr_in_db: Option<f64>,
    pub constellation_type: i32,
    #[serde(default)]
    pub agc_level_db: Option<f64>,
    #[serde(default)]
    pub baseband_cn0_db_hz: Option<f64>,
    #[serde(default)]
    pub full_inter_signal_bias_nanos: Option<f64>,
    #[serde(default)]
    pub full_inter_signal_bias_uncertainty_nanos: Option<f64>,
    #[serde(default)]
    pub satellite_inter_signal_bias_nanos: Option<f64>,
    #[serde(default)]
    pub satellite_inter_signal_bias_uncertainty_nanos: Option<f64>,
    #[serde(default)]
    pub code_type: Option<String>,
}

/// Batch of raw measurements sharing one clock
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GnssMeasurementsEvent {
    pub clock: GnssClock,
    pub measurements: Vec<GnssMeasurement>,
}

/// Decoded-frame navigation message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationMessage {
    pub svid: i32,
    pub message_type: i32,
    pub status: i32,
    pub message_id: i32,
    pub submessage_id: i32,
    #[serde(default)]
    pub data: Bytes,
}

/// Bluetooth Low-Energy advertisement scan result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BleScanResult {
    /// Boot-relative timestamp (ns)
    pub timestamp_nanos: i64,
    /// Device address
    pub device: String,
    pub rssi: i32,
    #[serde(default)]
    pub advertising_sid: i32,
    #[serde(default)]
    pub tx_power: i32,
    #[serde(default)]
    pub data_status: i32,
    /// Raw advertisement record, `None` when the platform supplied none
    #[serde(default)]
    pub scan_record: Option<Bytes>,
}

/// Any event a platform subscription can deliver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawEvent {
    Sensor(SensorEvent),
    Location(LocationFix),
    GnssMeasurements(GnssMeasurementsEvent),
    NavigationMessage(NavigationMessage),
    BleScan(BleScanResult),
}

impl RawEvent {
    /// Short name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sensor(_) => "sensor",
            Self::Location(_) => "location",
            Self::GnssMeasurements(_) => "gnss_measurements",
            Self::NavigationMessage(_) => "navigation_message",
            Self::BleScan(_) => "ble_scan",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_event_json_is_externally_tagged() {
        let event = RawEvent::NavigationMessage(NavigationMessage {
            svid: 3,
            message_type: 257,
            status: 1,
            message_id: 2,
            submessage_id: 1,
            data: Bytes::from_static(&[1, 2, 255]),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.starts_with("{\"navigation_message\":"));
        let back: RawEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn missing_optional_fields_default_to_none() {
        let json = r#"{"location":{"provider":"gps","latitude":60.1,"longitude":24.9,
            "time_millis":1700000000000,"elapsed_realtime_nanos":5}}"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();
        match event {
            RawEvent::Location(fix) => {
                assert_eq!(fix.altitude, None);
                assert_eq!(fix.vertical_accuracy_m, None);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
