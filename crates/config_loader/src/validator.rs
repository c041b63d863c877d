//! Config validation
//!
//! Rules:
//! - at least one sensor
//! - tags well formed and unique; location adapters may share a tag when
//!   their providers differ
//! - location adapters name a provider, named sensors a sensor name
//! - sampling period > 0 for periodic sources
//! - non-zero capacities, usable file prefix
//! - telemetry address is `host:port`

use std::collections::HashMap;
use std::net::SocketAddr;

use contracts::{AdapterConfig, ContractError, SensorKind, SessionBlueprint, Tag};

/// Validate a SessionBlueprint
///
/// Returns the first error found, or Ok(()).
pub fn validate(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    validate_session(blueprint)?;
    validate_sensors(blueprint)?;
    validate_tags(blueprint)?;
    validate_telemetry(blueprint)?;
    Ok(())
}

fn validate_session(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let session = &blueprint.session;
    if session.file_prefix.is_empty() {
        return Err(ContractError::config_validation(
            "session.file_prefix",
            "file prefix cannot be empty",
        ));
    }
    if session.file_prefix.contains(['/', '\\']) {
        return Err(ContractError::config_validation(
            "session.file_prefix",
            format!("file prefix '{}' must not contain a path separator", session.file_prefix),
        ));
    }
    if session.recent_capacity == 0 {
        return Err(ContractError::config_validation(
            "session.recent_capacity",
            "recent_capacity must be > 0",
        ));
    }
    Ok(())
}

fn validate_sensors(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    if blueprint.sensors.is_empty() {
        return Err(ContractError::config_validation(
            "sensors",
            "at least one sensor is required",
        ));
    }

    for (idx, sensor) in blueprint.sensors.iter().enumerate() {
        let field = |name: &str| format!("sensors[{idx}].{name}");
        match &sensor.kind {
            SensorKind::GnssLocation => {
                if sensor.provider.as_deref().map_or(true, str::is_empty) {
                    return Err(ContractError::config_validation(
                        field("provider"),
                        "gnss_location requires a provider name",
                    ));
                }
            }
            SensorKind::NamedGeneric(name) if name.is_empty() => {
                return Err(ContractError::config_validation(
                    field("kind"),
                    "named_generic requires a sensor name",
                ));
            }
            kind if sensor.provider.is_some() => {
                return Err(ContractError::config_validation(
                    field("provider"),
                    format!("provider only applies to gnss_location, not {kind}"),
                ));
            }
            _ => {}
        }

        if sensor.sampling_period_us == Some(0) && is_periodic(&sensor.kind) {
            return Err(ContractError::config_validation(
                field("sampling_period_us"),
                "sampling_period_us must be > 0",
            ));
        }
    }
    Ok(())
}

/// Sources that are polled at a requested period
fn is_periodic(kind: &SensorKind) -> bool {
    kind.hardware_type().is_some()
        || matches!(kind, SensorKind::NamedGeneric(_) | SensorKind::GnssLocation)
}

fn validate_tags(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let mut seen: HashMap<Tag, Vec<&AdapterConfig>> = HashMap::new();

    for (idx, sensor) in blueprint.sensors.iter().enumerate() {
        let tag = sensor.effective_tag();
        if !Tag::is_well_formed(&tag) {
            return Err(ContractError::config_validation(
                format!("sensors[{idx}].tag"),
                format!("tag '{tag}' must be non-empty without '#', ',' or whitespace"),
            ));
        }

        let previous = seen.entry(tag.clone()).or_default();
        for other in previous.iter() {
            let shareable = sensor.kind == SensorKind::GnssLocation
                && other.kind == SensorKind::GnssLocation
                && sensor.provider != other.provider;
            if !shareable {
                return Err(ContractError::config_validation(
                    format!("sensors[{idx}].tag"),
                    format!("duplicate tag '{tag}'"),
                ));
            }
        }
        previous.push(sensor);
    }
    Ok(())
}

fn validate_telemetry(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let Some(telemetry) = &blueprint.telemetry else {
        return Ok(());
    };

    if telemetry.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "telemetry.queue_capacity",
            "queue_capacity must be > 0",
        ));
    }
    if !is_host_port(&telemetry.addr) {
        return Err(ContractError::config_validation(
            "telemetry.addr",
            format!("'{}' is not a host:port address", telemetry.addr),
        ));
    }
    Ok(())
}

fn is_host_port(addr: &str) -> bool {
    if addr.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match addr.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty() && !host.contains(char::is_whitespace) && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DropPolicy, TelemetryConfig};

    fn blueprint(sensors: Vec<AdapterConfig>) -> SessionBlueprint {
        let mut bp = SessionBlueprint::default_android();
        bp.sensors = sensors;
        bp
    }

    #[test]
    fn default_android_is_valid() {
        assert!(validate(&SessionBlueprint::default_android()).is_ok());
    }

    #[test]
    fn duplicate_tag_is_rejected() {
        let bp = blueprint(vec![
            AdapterConfig::new(SensorKind::Accelerometer),
            AdapterConfig::new(SensorKind::Gyroscope).with_tag("ACC"),
        ]);
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("duplicate tag 'ACC'"));
    }

    #[test]
    fn location_tag_shared_only_across_providers() {
        let gps = AdapterConfig::new(SensorKind::GnssLocation).with_provider("gps");
        let bp = blueprint(vec![gps.clone(), gps]);
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn location_without_provider_is_rejected() {
        let bp = blueprint(vec![AdapterConfig::new(SensorKind::GnssLocation)]);
        assert!(validate(&bp).unwrap_err().to_string().contains("provider"));
    }

    #[test]
    fn malformed_tag_is_rejected() {
        let bp = blueprint(vec![AdapterConfig::new(SensorKind::Pressure).with_tag("P S R")]);
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn zero_period_only_for_periodic_sources() {
        let bp = blueprint(vec![AdapterConfig::new(SensorKind::Pressure).with_sampling_period_us(0)]);
        assert!(validate(&bp).is_err());

        let bp = blueprint(vec![AdapterConfig::new(SensorKind::Bluetooth).with_sampling_period_us(0)]);
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn empty_named_sensor_is_rejected() {
        let bp = blueprint(vec![AdapterConfig::new(SensorKind::NamedGeneric(String::new()))]);
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn telemetry_address_and_capacity() {
        let mut bp = SessionBlueprint::default_android();
        bp.telemetry = Some(TelemetryConfig {
            addr: "collector.local:7000".into(),
            queue_capacity: 16,
            drop_policy: DropPolicy::DropOldest,
        });
        assert!(validate(&bp).is_ok());

        bp.telemetry.as_mut().unwrap().addr = "collector.local".into();
        assert!(validate(&bp).is_err());

        let telemetry = bp.telemetry.as_mut().unwrap();
        telemetry.addr = "127.0.0.1:7000".into();
        telemetry.queue_capacity = 0;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn zero_recent_capacity_is_rejected() {
        let mut bp = SessionBlueprint::default_android();
        bp.session.recent_capacity = 0;
        assert!(validate(&bp).is_err());
    }
}
