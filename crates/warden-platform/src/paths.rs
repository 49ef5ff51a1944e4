use std::fs;
use std::path::{Path, PathBuf};

use warden_common::StorageError;

const APP_NAME: &str = "warden";

/// Returns the platform-specific configuration directory for Warden.
///
/// - macOS: `~/Library/Application Support/warden`
/// - Linux: `$XDG_CONFIG_HOME/warden` (defaults to `~/.config/warden`)
/// - Windows: `%APPDATA%\warden`
pub fn config_dir() -> Result<PathBuf, StorageError> {
    dirs::config_dir()
        .map(|p| p.join(APP_NAME))
        .ok_or_else(|| StorageError::PathError("could not determine config directory".into()))
}

/// Returns the platform-specific data directory for Warden.
///
/// - macOS: `~/Library/Application Support/warden`
/// - Linux: `$XDG_DATA_HOME/warden` (defaults to `~/.local/share/warden`)
/// - Windows: `%APPDATA%\warden`
pub fn data_dir() -> Result<PathBuf, StorageError> {
    dirs::data_dir()
        .map(|p| p.join(APP_NAME))
        .ok_or_else(|| StorageError::PathError("could not determine data directory".into()))
}

/// Returns the path to the log directory, `data_dir()/logs`.
pub fn log_dir() -> Result<PathBuf, StorageError> {
    Ok(data_dir()?.join("logs"))
}

/// Returns the crash report directory, `log_dir()/crash-reports`.
pub fn crash_report_dir() -> Result<PathBuf, StorageError> {
    Ok(log_dir()?.join("crash-reports"))
}

/// File locations for persisted state, rooted at one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Use `data_dir` when given, otherwise the platform data directory.
    pub fn resolve(data_dir_override: Option<&Path>) -> Result<Self, StorageError> {
        match data_dir_override {
            Some(dir) => Ok(Self::new(dir)),
            None => Ok(Self::new(data_dir()?)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cookie_file(&self) -> PathBuf {
        self.root.join("cookies.json")
    }

    pub fn block_cache_file(&self) -> PathBuf {
        self.root.join("vrchat-blocks.json")
    }

    pub fn custom_blocks_file(&self) -> PathBuf {
        self.root.join("custom-blocks.json")
    }

    pub fn kick_log_file(&self) -> PathBuf {
        self.root.join("kick-log.ndjson")
    }

    /// Creates the data directory if it does not already exist.
    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(|e| StorageError::io(&self.root, e))
    }
}
