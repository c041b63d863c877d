//! Header block generation
//!
//! Header text is a pure function of tag and kind, plus the live summary and
//! effective sampling period for enabled adapters.

use contracts::{DeviceInfo, LogEntry, SensorKind, Tag, FIELD_SEPARATOR};

use crate::schema::column_names;

/// `<Tag>,utcTimeMillis,elapsedRealtime_nanosecond,<cols...>` (without `#`)
pub fn column_line(tag: &Tag, kind: &SensorKind) -> String {
    let mut line = tag.to_string();
    for name in column_names(kind) {
        line.push(FIELD_SEPARATOR);
        line.push_str(name);
    }
    line
}

/// Three-line header of a registered adapter
pub fn enabled_header(
    tag: &Tag,
    kind: &SensorKind,
    sampling_period_us: u64,
    summary: &str,
) -> Vec<LogEntry> {
    vec![
        LogEntry::comment(format!(
            "Sensor {tag} enabled, Sampling Period: {sampling_period_us}, {summary}"
        )),
        LogEntry::comment(column_line(tag, kind)),
        LogEntry::comment(""),
    ]
}

/// Single line of an adapter that is unavailable or failed to register
pub fn disabled_header(tag: &Tag) -> LogEntry {
    LogEntry::comment(format!("Sensor {tag} disabled"))
}

/// Device metadata block written once at the top of the file
pub fn preamble(device: &DeviceInfo) -> Vec<LogEntry> {
    vec![
        LogEntry::comment(""),
        LogEntry::comment("Header Description:"),
        LogEntry::comment(""),
        LogEntry::comment(format!(
            "Version: {} Platform: {} Manufacturer: {} Model: {}",
            device.app_version, device.platform_release, device.manufacturer, device.model
        )),
        LogEntry::comment(""),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(entries: &[LogEntry]) -> Vec<String> {
        entries.iter().map(LogEntry::render).collect()
    }

    #[test]
    fn enabled_pressure_header() {
        let lines = render(&enabled_header(
            &"PSR".into(),
            &SensorKind::Pressure,
            20_000,
            "{Sensor name=\"BMP280\"}",
        ));
        assert_eq!(
            lines,
            vec![
                "# Sensor PSR enabled, Sampling Period: 20000, {Sensor name=\"BMP280\"}",
                "# PSR,utcTimeMillis,elapsedRealtime_nanosecond,pressure_hPa,accuracy",
                "#",
            ]
        );
    }

    #[test]
    fn disabled_line() {
        assert_eq!(disabled_header(&"BLE".into()).render(), "# Sensor BLE disabled");
    }

    #[test]
    fn preamble_block() {
        let device = DeviceInfo {
            app_version: "1.4".into(),
            platform_release: "14".into(),
            manufacturer: "Google".into(),
            model: "Pixel 8".into(),
        };
        assert_eq!(
            render(&preamble(&device)),
            vec![
                "#",
                "# Header Description:",
                "#",
                "# Version: 1.4 Platform: 14 Manufacturer: Google Model: Pixel 8",
                "#",
            ]
        );
    }
}
