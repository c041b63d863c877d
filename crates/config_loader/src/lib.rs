//! Session config files
//!
//! A `SessionBlueprint` comes from a `.toml` (preferred) or `.json` file and
//! is only handed out after it passed validation, so callers never see a
//! blueprint with clashing tags or an unusable telemetry target.
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("session.toml")).unwrap();
//! for sensor in &blueprint.sensors {
//!     println!("{}", sensor.effective_tag());
//! }
//! ```

mod parser;
mod validator;

pub use contracts::SessionBlueprint;
pub use parser::ConfigFormat;

use std::path::Path;

use contracts::ContractError;

/// Reads, writes and checks session blueprints
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read a blueprint file, picking the parser from its extension
    ///
    /// # Errors
    /// `ConfigParse` for an unknown extension, bad syntax or a blueprint that
    /// fails validation; `Io` when the file cannot be read.
    pub fn load_from_path(path: &Path) -> Result<SessionBlueprint, ContractError> {
        let format = format_of(path)?;
        let text = std::fs::read_to_string(path)?;
        Self::load_from_str(&text, format)
    }

    /// Parse blueprint text and validate it
    pub fn load_from_str(text: &str, format: ConfigFormat) -> Result<SessionBlueprint, ContractError> {
        let blueprint = parser::parse(text, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Check a blueprint built in code (or edited after loading)
    pub fn validate(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    pub fn to_toml(blueprint: &SessionBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("cannot write blueprint as TOML: {e}")))
    }

    pub fn to_json(blueprint: &SessionBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("cannot write blueprint as JSON: {e}")))
    }
}

fn format_of(path: &Path) -> Result<ConfigFormat, ContractError> {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Err(ContractError::config_parse(format!(
            "{} has no extension, expected .toml or .json",
            path.display()
        )));
    };
    ConfigFormat::from_extension(ext)
        .ok_or_else(|| ContractError::config_parse(format!("unsupported config format: .{ext}")))
}
