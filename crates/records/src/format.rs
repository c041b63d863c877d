//! Raw event -> Record
//!
//! Pure functions: the same event and arrival stamp always give the same
//! records. Values pass through verbatim; only rendering is applied.

use contracts::{
    BleScanResult, GnssClock, GnssMeasurement, GnssMeasurementsEvent, LocationFix,
    NavigationMessage, RawEvent, Record, SensorEvent, SensorKind, Tag,
};
use thiserror::Error;

use crate::schema::schema_for;
use crate::value::FieldValue;

/// Clock readings taken when an event reached its adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrivalStamp {
    pub utc_millis: i64,
    pub elapsed_realtime_nanos: i64,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The event category does not belong to the adapter's kind
    #[error("{event} event cannot be formatted as {kind}")]
    KindMismatch { kind: SensorKind, event: &'static str },
}

/// Format one raw event into its records
///
/// Every kind yields exactly one record, except GNSS raw measurements which
/// yield one record per contained measurement (zero for an empty event).
///
/// # Errors
/// `KindMismatch` when the event category does not match `kind`.
pub fn format_event(
    tag: &Tag,
    kind: &SensorKind,
    event: &RawEvent,
    arrival: ArrivalStamp,
) -> Result<Vec<Record>, FormatError> {
    let mismatch = || FormatError::KindMismatch {
        kind: kind.clone(),
        event: event.name(),
    };

    let rows: Vec<(i64, Vec<FieldValue>)> = match (kind, event) {
        (SensorKind::GnssLocation, RawEvent::Location(fix)) => {
            vec![(fix.elapsed_realtime_nanos, location_fields(fix))]
        }
        (SensorKind::GnssRawMeasurement, RawEvent::GnssMeasurements(raw)) => {
            raw_measurement_rows(raw)
                .map(|fields| (arrival.elapsed_realtime_nanos, fields))
                .collect()
        }
        (SensorKind::GnssNavigationMessage, RawEvent::NavigationMessage(nav)) => {
            vec![(arrival.elapsed_realtime_nanos, navigation_fields(nav))]
        }
        (SensorKind::Bluetooth, RawEvent::BleScan(scan)) => {
            vec![(scan.timestamp_nanos, bluetooth_fields(scan))]
        }
        (SensorKind::NamedGeneric(_), RawEvent::Sensor(sample)) => {
            vec![(sample.timestamp_nanos, named_fields(sample))]
        }
        (kind, RawEvent::Sensor(sample)) if kind.hardware_type() == Some(sample.sensor_type) => {
            let width = schema_for(kind).len() - 1;
            vec![(sample.timestamp_nanos, vector_fields(sample, width))]
        }
        _ => return Err(mismatch()),
    };

    Ok(rows
        .into_iter()
        .map(|(elapsed, fields)| Record {
            tag: tag.clone(),
            utc_millis: arrival.utc_millis,
            elapsed_realtime_nanos: elapsed,
            fields: fields.iter().map(FieldValue::render).collect(),
            arrival_nanos: arrival.elapsed_realtime_nanos,
        })
        .collect())
}

/// `width` leading values followed by the accuracy code
fn vector_fields(sample: &SensorEvent, width: usize) -> Vec<FieldValue> {
    let mut fields: Vec<FieldValue> = (0..width)
        .map(|i| FieldValue::opt_float32(sample.values.get(i).copied()))
        .collect();
    fields.push(FieldValue::Int(sample.accuracy.into()));
    fields
}

fn named_fields(sample: &SensorEvent) -> Vec<FieldValue> {
    vec![
        FieldValue::Int(sample.accuracy.into()),
        FieldValue::FloatList(sample.values.clone()),
    ]
}

fn location_fields(fix: &LocationFix) -> Vec<FieldValue> {
    vec![
        FieldValue::text(&fix.provider.to_uppercase()),
        FieldValue::Fixed(fix.latitude, 8),
        FieldValue::Fixed(fix.longitude, 8),
        FieldValue::opt_fixed(fix.altitude, 3),
        FieldValue::opt_fixed(fix.speed, 3),
        FieldValue::opt_fixed(fix.accuracy, 3),
        FieldValue::opt_fixed(fix.bearing, 3),
        FieldValue::Int(fix.time_millis),
        FieldValue::opt_float32(fix.speed_accuracy_mps),
        FieldValue::opt_float32(fix.bearing_accuracy_deg),
        FieldValue::opt_float32(fix.vertical_accuracy_m),
        FieldValue::opt_float(fix.elapsed_realtime_uncertainty_nanos),
    ]
}

fn clock_fields(clock: &GnssClock) -> Vec<FieldValue> {
    vec![
        FieldValue::Int(clock.time_nanos),
        FieldValue::opt_int(clock.leap_second),
        FieldValue::opt_float(clock.time_uncertainty_nanos),
        FieldValue::opt_int(clock.full_bias_nanos),
        FieldValue::opt_float(clock.bias_nanos),
        FieldValue::opt_float(clock.bias_uncertainty_nanos),
        FieldValue::opt_float(clock.drift_nanos_per_second),
        FieldValue::opt_float(clock.drift_uncertainty_nanos_per_second),
        FieldValue::Int(clock.hardware_clock_discontinuity_count.into()),
    ]
}

fn measurement_fields(m: &GnssMeasurement) -> [FieldValue; 25] {
    [
        FieldValue::Int(m.svid.into()),
        FieldValue::Float(m.time_offset_nanos),
        FieldValue::Int(m.state.into()),
        FieldValue::Int(m.received_sv_time_nanos),
        FieldValue::Int(m.received_sv_time_uncertainty_nanos),
        FieldValue::Float(m.cn0_db_hz),
        FieldValue::Float(m.pseudorange_rate_mps),
        FieldValue::Float(m.pseudorange_rate_uncertainty_mps),
        FieldValue::Int(m.accumulated_delta_range_state.into()),
        FieldValue::Float(m.accumulated_delta_range_meters),
        FieldValue::Float(m.accumulated_delta_range_uncertainty_meters),
        FieldValue::opt_float32(m.carrier_frequency_hz),
        FieldValue::opt_int(m.carrier_cycles),
        FieldValue::opt_float(m.carrier_phase),
        FieldValue::opt_float(m.carrier_phase_uncertainty),
        FieldValue::Int(m.multipath_indicator.into()),
        FieldValue::opt_float(m.snr_in_db),
        FieldValue::Int(m.constellation_type.into()),
        FieldValue::opt_float(m.agc_level_db),
        FieldValue::opt_float(m.baseband_cn0_db_hz),
        FieldValue::opt_float(m.full_inter_signal_bias_nanos),
        FieldValue::opt_float(m.full_inter_signal_bias_uncertainty_nanos),
        FieldValue::opt_float(m.satellite_inter_signal_bias_nanos),
        FieldValue::opt_float(m.satellite_inter_signal_bias_uncertainty_nanos),
        m.code_type
            .as_deref()
            .map_or(FieldValue::Absent, FieldValue::text),
    ]
}

/// One row per measurement, all sharing the same clock columns
fn raw_measurement_rows(raw: &GnssMeasurementsEvent) -> impl Iterator<Item = Vec<FieldValue>> + '_ {
    let clock = clock_fields(&raw.clock);
    let chipset_elapsed = FieldValue::opt_int(raw.clock.elapsed_realtime_nanos);
    raw.measurements.iter().map(move |m| {
        let mut fields = clock.clone();
        fields.extend(measurement_fields(m));
        fields.push(chipset_elapsed.clone());
        fields
    })
}

fn navigation_fields(nav: &NavigationMessage) -> Vec<FieldValue> {
    vec![
        FieldValue::Int(nav.svid.into()),
        FieldValue::Int(nav.message_type.into()),
        FieldValue::Int(nav.status.into()),
        FieldValue::Int(nav.message_id.into()),
        FieldValue::Int(nav.submessage_id.into()),
        FieldValue::Bytes(nav.data.clone()),
    ]
}

fn bluetooth_fields(scan: &BleScanResult) -> Vec<FieldValue> {
    vec![
        FieldValue::text(&scan.device),
        FieldValue::Int(scan.rssi.into()),
        FieldValue::Int(scan.advertising_sid.into()),
        FieldValue::Int(scan.tx_power.into()),
        FieldValue::Int(scan.data_status.into()),
        FieldValue::Bytes(scan.scan_record.clone().unwrap_or_default()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::HardwareSensorType;

    const ARRIVAL: ArrivalStamp = ArrivalStamp {
        utc_millis: 1_700_000_000_123,
        elapsed_realtime_nanos: 555,
    };

    fn sample(sensor_type: HardwareSensorType, values: Vec<f32>) -> RawEvent {
        RawEvent::Sensor(SensorEvent {
            sensor_type,
            sensor_name: String::new(),
            timestamp_nanos: 42,
            values,
            accuracy: 3,
        })
    }

    #[test]
    fn accelerometer_line() {
        let event = sample(HardwareSensorType::Accelerometer, vec![0.1, -0.25, 9.81]);
        let records =
            format_event(&"ACC".into(), &SensorKind::Accelerometer, &event, ARRIVAL).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].to_line(), "ACC,1700000000123,42,0.1,-0.25,9.81,3");
    }

    #[test]
    fn short_value_array_renders_empty_fields() {
        let event = sample(HardwareSensorType::GyroscopeUncalibrated, vec![1.0, 2.0, 3.0]);
        let records = format_event(
            &"GYRO_UNCAL".into(),
            &SensorKind::GyroscopeUncalibrated,
            &event,
            ARRIVAL,
        )
        .unwrap();
        assert_eq!(records[0].to_line(), "GYRO_UNCAL,1700000000123,42,1,2,3,,,,3");
    }

    #[test]
    fn location_precision() {
        let event = RawEvent::Location(LocationFix {
            provider: "gps".into(),
            latitude: 60.16952,
            longitude: 24.93545,
            altitude: Some(12.5),
            speed: Some(1.25),
            accuracy: Some(3.9),
            bearing: None,
            time_millis: 1_700_000_000_000,
            speed_accuracy_mps: Some(0.5),
            bearing_accuracy_deg: None,
            elapsed_realtime_nanos: 99,
            vertical_accuracy_m: Some(2.0),
            elapsed_realtime_uncertainty_nanos: None,
        });
        let records = format_event(&"Fix".into(), &SensorKind::GnssLocation, &event, ARRIVAL).unwrap();
        assert_eq!(
            records[0].to_line(),
            "Fix,1700000000123,99,GPS,60.16952000,24.93545000,12.500,1.250,3.900,,1700000000000,0.5,,2,"
        );
    }

    #[test]
    fn navigation_message_uses_arrival_time() {
        let event = RawEvent::NavigationMessage(NavigationMessage {
            svid: 7,
            message_type: 0x0101,
            status: 1,
            message_id: 3,
            submessage_id: 2,
            data: bytes::Bytes::from_static(&[139, 0, 255]),
        });
        let records =
            format_event(&"Nav".into(), &SensorKind::GnssNavigationMessage, &event, ARRIVAL).unwrap();
        assert_eq!(records[0].to_line(), "Nav,1700000000123,555,7,257,1,3,2,[139,0,255]");
    }

    #[test]
    fn empty_raw_event_yields_no_records() {
        let event = RawEvent::GnssMeasurements(GnssMeasurementsEvent::default());
        let records =
            format_event(&"Raw".into(), &SensorKind::GnssRawMeasurement, &event, ARRIVAL).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn mismatched_event_is_rejected() {
        let event = sample(HardwareSensorType::Gyroscope, vec![0.0, 0.0, 0.0]);
        let err = format_event(&"ACC".into(), &SensorKind::Accelerometer, &event, ARRIVAL).unwrap_err();
        assert_eq!(
            err,
            FormatError::KindMismatch {
                kind: SensorKind::Accelerometer,
                event: "sensor"
            }
        );

        let ble = RawEvent::BleScan(BleScanResult::default());
        assert!(format_event(&"Fix".into(), &SensorKind::GnssLocation, &ble, ARRIVAL).is_err());
    }

    #[test]
    fn named_sensor_values_are_bracketed() {
        let event = sample(HardwareSensorType::Other, vec![1.5, 2.0]);
        let kind = SensorKind::NamedGeneric("LPS22H".into());
        let records = format_event(&"BARO2".into(), &kind, &event, ARRIVAL).unwrap();
        assert_eq!(records[0].to_line(), "BARO2,1700000000123,42,3,[1.5,2]");
    }
}
