use std::path::{Path, PathBuf};

use tracing::info;
use warden_common::ConfigError;

use super::template::default_config_toml;

const CONFIG_FILE: &str = "config.toml";

/// `<platform config dir>/warden/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("warden").join(CONFIG_FILE))
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))
}

/// Write the commented template to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_err = |target: &Path, e: std::io::Error| {
        ConfigError::ParseError(format!("cannot write {}: {e}", target.display()))
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;
    }
    std::fs::write(path, default_config_toml()).map_err(|e| write_err(path, e))?;

    info!(path = %path.display(), "wrote default config");
    Ok(())
}
