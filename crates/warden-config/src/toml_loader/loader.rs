//! Reading `config.toml` from an explicit path or the platform default.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{info, warn};
use warden_common::ConfigError;

use super::paths::{create_default_config, default_config_path};
use crate::schema::WardenConfig;
use crate::validation;

/// Parse a config file, filling missing fields from defaults.
///
/// Out-of-range values are logged and kept; callers that must reject them
/// run [`validation::validate`] themselves.
pub fn load_from_path(path: &Path) -> Result<WardenConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        }
    };

    let config: WardenConfig = toml::from_str(&content).map_err(|e| {
        ConfigError::ParseError(format!("{}: {e}", path.display()))
    })?;

    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), "keeping config with invalid values: {e}");
    }
    info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Load `<config dir>/warden/config.toml`, writing the template on first run.
pub fn load_default() -> Result<WardenConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            create_default_config(&path)?;
            Ok(WardenConfig::default())
        }
        other => other,
    }
}
