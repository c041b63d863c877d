//! Per-kind record schemas
//!
//! One static column list per kind. Header lines and data lines are both
//! generated from these lists, so their field count cannot drift apart.

use contracts::SensorKind;

/// Column value type, decides rendering and parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Base-10 integer
    Int,
    /// Shortest round-trip decimal
    Float,
    /// Fixed number of decimals
    Fixed(u8),
    /// Free text without separators
    Text,
    /// Bracketed unsigned byte list, `[]` when empty
    ByteList,
    /// Bracketed float list
    FloatList,
}

/// One named, typed column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: FieldType,
}

const fn col(name: &'static str, ty: FieldType) -> Column {
    Column { name, ty }
}

use FieldType::{ByteList, Fixed, Float, FloatList, Int, Text};

/// Columns every data line carries right after the tag
pub const FIXED_COLUMNS: [&str; 2] = ["utcTimeMillis", "elapsedRealtime_nanosecond"];

const ACCELEROMETER: &[Column] = &[
    col("x_meterPerSecond2", Float),
    col("y_meterPerSecond2", Float),
    col("z_meterPerSecond2", Float),
    col("accuracy", Int),
];

const GYROSCOPE: &[Column] = &[
    col("x_radPerSecond", Float),
    col("y_radPerSecond", Float),
    col("z_radPerSecond", Float),
    col("accuracy", Int),
];

const MAGNETIC_FIELD: &[Column] = &[
    col("x_microTesla", Float),
    col("y_microTesla", Float),
    col("z_microTesla", Float),
    col("accuracy", Int),
];

const ACCELEROMETER_UNCALIBRATED: &[Column] = &[
    col("x_uncalibrated_meterPerSecond2", Float),
    col("y_uncalibrated_meterPerSecond2", Float),
    col("z_uncalibrated_meterPerSecond2", Float),
    col("x_bias_meterPerSecond2", Float),
    col("y_bias_meterPerSecond2", Float),
    col("z_bias_meterPerSecond2", Float),
    col("accuracy", Int),
];

const GYROSCOPE_UNCALIBRATED: &[Column] = &[
    col("x_uncalibrated_radPerSecond", Float),
    col("y_uncalibrated_radPerSecond", Float),
    col("z_uncalibrated_radPerSecond", Float),
    col("x_bias_radPerSecond", Float),
    col("y_bias_radPerSecond", Float),
    col("z_bias_radPerSecond", Float),
    col("accuracy", Int),
];

const MAGNETIC_FIELD_UNCALIBRATED: &[Column] = &[
    col("x_uncalibrated_microTesla", Float),
    col("y_uncalibrated_microTesla", Float),
    col("z_uncalibrated_microTesla", Float),
    col("x_bias_microTesla", Float),
    col("y_bias_microTesla", Float),
    col("z_bias_microTesla", Float),
    col("accuracy", Int),
];

const PRESSURE: &[Column] = &[col("pressure_hPa", Float), col("accuracy", Int)];

const HEART_RATE: &[Column] = &[col("rate_beatPerSecond", Float), col("accuracy", Int)];

const STEP_COUNTER: &[Column] = &[col("steps_count", Float), col("accuracy", Int)];

const STEP_DETECTOR: &[Column] = &[col("step_detected", Float), col("accuracy", Int)];

const NAMED_GENERIC: &[Column] = &[col("accuracy", Int), col("values", FloatList)];

const GNSS_LOCATION: &[Column] = &[
    col("Provider", Text),
    col("Latitude_decimalDegree", Fixed(8)),
    col("Longitude_decimalDegree", Fixed(8)),
    col("Altitude_meter", Fixed(3)),
    col("Speed_meterPerSecond", Fixed(3)),
    col("Accuracy_meter", Fixed(3)),
    col("Bearing_degree", Fixed(3)),
    col("UnixTime_millisecond", Int),
    col("SpeedAccuracy_meterPerSecond", Float),
    col("BearingAccuracy_degree", Float),
    col("VerticalAccuracy_meter", Float),
    col("ElapsedRealtimeUncertainty_nanosecond", Float),
];

/// Clock columns shared by every record of one raw measurement event
pub const GNSS_CLOCK_COLUMNS: usize = 9;

const GNSS_RAW_MEASUREMENT: &[Column] = &[
    // clock
    col("TimeNanos", Int),
    col("LeapSecond", Int),
    col("TimeUncertaintyNanos", Float),
    col("FullBiasNanos", Int),
    col("BiasNanos", Float),
    col("BiasUncertaintyNanos", Float),
    col("DriftNanosPerSecond", Float),
    col("DriftUncertaintyNanosPerSecond", Float),
    col("HardwareClockDiscontinuityCount", Int),
    // measurement
    col("Svid", Int),
    col("TimeOffsetNanos", Float),
    col("State", Int),
    col("ReceivedSvTimeNanos", Int),
    col("ReceivedSvTimeUncertaintyNanos", Int),
    col("Cn0DbHz", Float),
    col("PseudorangeRateMetersPerSecond", Float),
    col("PseudorangeRateUncertaintyMetersPerSecond", Float),
    col("AccumulatedDeltaRangeState", Int),
    col("AccumulatedDeltaRangeMeters", Float),
    col("AccumulatedDeltaRangeUncertaintyMeters", Float),
    col("CarrierFrequencyHz", Float),
    col("CarrierCycles", Int),
    col("CarrierPhase", Float),
    col("CarrierPhaseUncertainty", Float),
    col("MultipathIndicator", Int),
    col("SnrInDb", Float),
    col("ConstellationType", Int),
    col("AgcDb", Float),
    col("BasebandCn0DbHz", Float),
    col("FullInterSignalBiasNanos", Float),
    col("FullInterSignalBiasUncertaintyNanos", Float),
    col("SatelliteInterSignalBiasNanos", Float),
    col("SatelliteInterSignalBiasUncertaintyNanos", Float),
    col("CodeType", Text),
    col("ChipsetElapsedRealtimeNanos", Int),
];

const GNSS_NAVIGATION_MESSAGE: &[Column] = &[
    col("Svid", Int),
    col("Type", Int),
    col("Status", Int),
    col("MessageId", Int),
    col("Sub-messageId", Int),
    col("Data(Bytes)", ByteList),
];

const BLUETOOTH: &[Column] = &[
    col("Device", Text),
    col("Rssi", Int),
    col("AdvertisingSid", Int),
    col("TxPower", Int),
    col("DataStatus", Int),
    col("Data(Bytes)", ByteList),
];

/// Ordered kind-specific columns (after the fixed columns)
pub fn schema_for(kind: &SensorKind) -> &'static [Column] {
    match kind {
        SensorKind::Accelerometer => ACCELEROMETER,
        SensorKind::Gyroscope => GYROSCOPE,
        SensorKind::MagneticField => MAGNETIC_FIELD,
        SensorKind::AccelerometerUncalibrated => ACCELEROMETER_UNCALIBRATED,
        SensorKind::GyroscopeUncalibrated => GYROSCOPE_UNCALIBRATED,
        SensorKind::MagneticFieldUncalibrated => MAGNETIC_FIELD_UNCALIBRATED,
        SensorKind::Pressure => PRESSURE,
        SensorKind::GnssLocation => GNSS_LOCATION,
        SensorKind::GnssRawMeasurement => GNSS_RAW_MEASUREMENT,
        SensorKind::GnssNavigationMessage => GNSS_NAVIGATION_MESSAGE,
        SensorKind::Bluetooth => BLUETOOTH,
        SensorKind::HeartRate => HEART_RATE,
        SensorKind::StepCounter => STEP_COUNTER,
        SensorKind::StepDetector => STEP_DETECTOR,
        SensorKind::NamedGeneric(_) => NAMED_GENERIC,
    }
}

/// Column names of a kind, fixed columns included
pub fn column_names(kind: &SensorKind) -> impl Iterator<Item = &'static str> {
    FIXED_COLUMNS
        .into_iter()
        .chain(schema_for(kind).iter().map(|c| c.name))
}

/// Find the kind whose column list equals `columns` (fixed columns excluded)
///
/// Used by the log reader, which only has header lines to go on. Named
/// sensors all share one schema, so the returned kind carries an empty name.
pub fn identify_kind(columns: &[&str]) -> Option<SensorKind> {
    let named = SensorKind::NamedGeneric(String::new());
    SensorKind::BUILTIN
        .iter()
        .chain(std::iter::once(&named))
        .find(|kind| {
            let schema = schema_for(kind);
            schema.len() == columns.len()
                && schema.iter().zip(columns).all(|(c, name)| c.name == *name)
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_schema_layout() {
        let schema = schema_for(&SensorKind::GnssRawMeasurement);
        assert_eq!(schema.len(), GNSS_CLOCK_COLUMNS + 25 + 1);
        assert_eq!(schema[GNSS_CLOCK_COLUMNS].name, "Svid");
        assert_eq!(schema[schema.len() - 1].name, "ChipsetElapsedRealtimeNanos");
    }

    #[test]
    fn identify_kind_from_columns() {
        let cols: Vec<_> = schema_for(&SensorKind::Bluetooth).iter().map(|c| c.name).collect();
        assert_eq!(identify_kind(&cols), Some(SensorKind::Bluetooth));

        let cols: Vec<_> = schema_for(&SensorKind::MagneticField).iter().map(|c| c.name).collect();
        assert_eq!(identify_kind(&cols), Some(SensorKind::MagneticField));

        assert_eq!(identify_kind(&["nope"]), None);
    }

    #[test]
    fn builtin_schemas_are_distinct() {
        for (i, a) in SensorKind::BUILTIN.iter().enumerate() {
            for b in SensorKind::BUILTIN.iter().skip(i + 1) {
                assert_ne!(schema_for(a), schema_for(b), "{a} and {b} share a schema");
            }
        }
    }
}
