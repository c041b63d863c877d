//! Synthetic event generation
//!
//! Deterministic, slowly varying values so generated logs are easy to eyeball.

use std::time::Duration;

use bytes::Bytes;
use contracts::{
    BleScanResult, GnssClock, GnssMeasurement, GnssMeasurementsEvent, HardwareSensorType,
    LocationFix, NavigationMessage, RawEvent, SensorEvent, SensorInfo, SubscriptionRequest,
};

/// Fallback rate for on-change sources
const ON_CHANGE_INTERVAL: Duration = Duration::from_millis(200);

/// Fastest rate a generator thread runs at
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Unix time at boot of the simulated device (ms)
pub const SIM_EPOCH_MILLIS: i64 = 1_700_000_000_000;

/// How often a generator emits for `request`
pub fn interval_for(request: &SubscriptionRequest) -> Duration {
    let interval = match request {
        SubscriptionRequest::Sensor {
            sampling_period_us, ..
        } => match *sampling_period_us {
            0 => ON_CHANGE_INTERVAL,
            us => Duration::from_micros(us),
        },
        SubscriptionRequest::Location {
            min_interval_ms, ..
        } => match *min_interval_ms {
            0 => Duration::from_secs(1),
            ms => Duration::from_millis(ms),
        },
        SubscriptionRequest::GnssMeasurements => Duration::from_secs(1),
        SubscriptionRequest::NavigationMessages => Duration::from_millis(500),
        SubscriptionRequest::BluetoothScan => Duration::from_millis(300),
    };
    interval.max(MIN_INTERVAL)
}

/// Event number `seq` of a subscription, stamped at `elapsed_nanos` since boot
pub fn synthesize(request: &SubscriptionRequest, seq: u64, elapsed_nanos: i64) -> RawEvent {
    let t = elapsed_nanos as f64 / 1e9;
    match request {
        SubscriptionRequest::Sensor { sensor, .. } => RawEvent::Sensor(sensor_event(sensor, seq, t, elapsed_nanos)),
        SubscriptionRequest::Location { provider, .. } => RawEvent::Location(location_fix(provider, seq, elapsed_nanos)),
        SubscriptionRequest::GnssMeasurements => RawEvent::GnssMeasurements(measurements(seq, elapsed_nanos)),
        SubscriptionRequest::NavigationMessages => RawEvent::NavigationMessage(NavigationMessage {
            svid: 1 + (seq % 32) as i32,
            message_type: 0x0101,
            status: 1,
            message_id: 1 + (seq % 5) as i32,
            submessage_id: 1,
            data: Bytes::from(vec![0x8b, (seq % 256) as u8, 0x00, 0xff]),
        }),
        SubscriptionRequest::BluetoothScan => RawEvent::BleScan(BleScanResult {
            timestamp_nanos: elapsed_nanos,
            device: format!("AA:BB:CC:DD:EE:{:02X}", seq % 4),
            rssi: -60 - (seq % 20) as i32,
            advertising_sid: 255,
            tx_power: 127,
            data_status: 0,
            scan_record: Some(Bytes::from(vec![0x02, 0x01, 0x06])),
        }),
    }
}

fn sensor_event(sensor: &SensorInfo, seq: u64, t: f64, elapsed_nanos: i64) -> SensorEvent {
    let wave = (t * std::f64::consts::TAU * 0.5).sin() as f32;
    let values = match sensor.sensor_type {
        HardwareSensorType::Accelerometer => vec![0.1 * wave, 0.05 * wave, 9.81],
        HardwareSensorType::Gyroscope => vec![0.01 * wave, -0.02 * wave, 0.0],
        HardwareSensorType::MagneticField => vec![22.0 + wave, -5.0, -40.0],
        HardwareSensorType::AccelerometerUncalibrated => {
            vec![0.1 * wave, 0.05 * wave, 9.81, 0.01, 0.02, 0.03]
        }
        HardwareSensorType::GyroscopeUncalibrated => {
            vec![0.01 * wave, -0.02 * wave, 0.0, 0.001, 0.001, 0.001]
        }
        HardwareSensorType::MagneticFieldUncalibrated => {
            vec![30.0 + wave, 2.0, -35.0, 8.0, 7.0, 5.0]
        }
        HardwareSensorType::Pressure => vec![1013.25 + 0.1 * wave],
        HardwareSensorType::HeartRate => vec![72.0 + 3.0 * wave],
        HardwareSensorType::StepCounter => vec![seq as f32],
        HardwareSensorType::StepDetector => vec![1.0],
        HardwareSensorType::Other => vec![wave, 0.0, 1.0],
    };

    SensorEvent {
        sensor_type: sensor.sensor_type,
        sensor_name: sensor.name.clone(),
        timestamp_nanos: elapsed_nanos,
        values,
        accuracy: 3,
    }
}

fn location_fix(provider: &str, seq: u64, elapsed_nanos: i64) -> LocationFix {
    let gps = provider == "gps";
    LocationFix {
        provider: provider.to_string(),
        latitude: 60.16952 + seq as f64 * 1e-5,
        longitude: 24.93545 + seq as f64 * 2e-5,
        altitude: gps.then_some(12.5),
        speed: Some(1.25),
        accuracy: Some(if gps { 3.9 } else { 25.0 }),
        bearing: gps.then_some(90.0),
        time_millis: SIM_EPOCH_MILLIS + elapsed_nanos / 1_000_000,
        speed_accuracy_mps: gps.then_some(0.5),
        bearing_accuracy_deg: gps.then_some(10.0),
        elapsed_realtime_nanos: elapsed_nanos,
        vertical_accuracy_m: gps.then_some(4.0),
        elapsed_realtime_uncertainty_nanos: Some(1000.0),
    }
}

fn measurements(seq: u64, elapsed_nanos: i64) -> GnssMeasurementsEvent {
    let clock = GnssClock {
        time_nanos: elapsed_nanos,
        leap_second: Some(18),
        time_uncertainty_nanos: None,
        full_bias_nanos: Some(-1_300_000_000_000_000_000),
        bias_nanos: Some(0.25),
        bias_uncertainty_nanos: Some(20.0),
        drift_nanos_per_second: Some(1.5),
        drift_uncertainty_nanos_per_second: Some(0.1),
        hardware_clock_discontinuity_count: 0,
        elapsed_realtime_nanos: Some(elapsed_nanos),
    };

    let measurements = [3, 7, 12]
        .into_iter()
        .enumerate()
        .map(|(i, svid)| GnssMeasurement {
            svid,
            state: 16_431,
            received_sv_time_nanos: elapsed_nanos + i as i64 * 1000,
            received_sv_time_uncertainty_nanos: 20,
            cn0_db_hz: 35.0 + i as f64 + (seq % 3) as f64,
            pseudorange_rate_mps: -120.5 + i as f64,
            pseudorange_rate_uncertainty_mps: 0.05,
            carrier_frequency_hz: Some(1_575_420_000.0),
            multipath_indicator: 0,
            constellation_type: 1,
            code_type: Some("C".to_string()),
            ..GnssMeasurement::default()
        })
        .collect();

    GnssMeasurementsEvent {
        clock,
        measurements,
    }
}
