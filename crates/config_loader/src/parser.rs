//! Config parsing
//!
//! TOML (primary) and JSON.

use contracts::{ContractError, SessionBlueprint};

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML config
pub fn parse_toml(content: &str) -> Result<SessionBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON config
pub fn parse_json(content: &str) -> Result<SessionBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse(content: &str, format: ConfigFormat) -> Result<SessionBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DropPolicy, SensorKind};

    #[test]
    fn parse_toml_with_defaults() {
        let content = r#"
[[sensors]]
kind = "accelerometer"

[[sensors]]
kind = "gnss_location"
provider = "gps"
sampling_period_us = 500000

[[sensors]]
kind = { named_generic = "LPS22H Barometer" }
tag = "BARO"
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.sensors.len(), 3);
        assert_eq!(bp.session.file_prefix, "log_mobile");
        assert_eq!(bp.sensors[1].provider.as_deref(), Some("gps"));
        assert_eq!(
            bp.sensors[2].kind,
            SensorKind::NamedGeneric("LPS22H Barometer".into())
        );
        assert!(bp.telemetry.is_none());
    }

    #[test]
    fn parse_json_with_telemetry() {
        let content = r#"{
            "session": { "output_dir": "/tmp/logs", "recent_capacity": 8 },
            "sensors": [{ "kind": "bluetooth", "enabled": false }],
            "telemetry": { "addr": "127.0.0.1:9999", "drop_policy": "drop_newest" }
        }"#;
        let bp = parse_json(content).unwrap();
        assert_eq!(bp.session.recent_capacity, 8);
        assert!(!bp.sensors[0].enabled);
        let telemetry = bp.telemetry.unwrap();
        assert_eq!(telemetry.queue_capacity, 32);
        assert_eq!(telemetry.drop_policy, DropPolicy::DropNewest);
    }

    #[test]
    fn parse_toml_syntax_error() {
        let err = parse_toml("invalid toml [[[").unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let err = parse_toml("[[sensors]]\nkind = \"thermometer\"\n").unwrap_err();
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
