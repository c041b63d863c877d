//! Command implementations.

mod info;
mod inspect;
mod run;
mod validate;

pub use info::run_info;
pub use inspect::run_inspect;
pub use run::run_session;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::SessionBlueprint;

use crate::error::CliError;

/// Load a config file, or fall back to the built-in phone sensor set
pub(crate) fn load_blueprint(path: Option<&Path>) -> Result<SessionBlueprint> {
    let Some(path) = path else {
        return Ok(SessionBlueprint::default_android());
    };
    if !path.exists() {
        return Err(CliError::config_not_found(path).into());
    }
    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
