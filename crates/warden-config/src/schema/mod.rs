//! Configuration schema types for Warden.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with sensible defaults.

mod api;
mod automation;
mod system;

pub use api::*;
pub use automation::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Warden.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct WardenConfig {
    pub api: ApiConfig,
    pub rate_limits: RateLimitConfig,
    pub automation: AutomationConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_config_has_correct_api() {
        let config = WardenConfig::default();
        assert_eq!(config.api.base_url, "https://api.vrchat.cloud/api/1");
        assert!(config.api.user_agent.starts_with("InstanceWarden/"));
        assert_eq!(config.api.connect_timeout_secs, 10);
        assert_eq!(config.api.request_timeout_secs, 30);
    }

    #[test]
    fn default_config_has_correct_rate_limits() {
        let config = WardenConfig::default();
        assert_eq!(config.rate_limits.auth_interval(), Duration::from_secs(2));
        assert_eq!(config.rate_limits.api_interval(), Duration::from_secs(1));
    }

    #[test]
    fn default_config_has_correct_automation() {
        let config = WardenConfig::default();
        assert!(config.automation.enabled);
        assert_eq!(config.automation.scan_interval(), Duration::from_secs(60));
        assert_eq!(config.automation.recent_locations_limit, 50);
    }

    #[test]
    fn default_config_has_correct_session_timeouts() {
        let config = WardenConfig::default();
        assert_eq!(config.session.restore_timeout(), Duration::from_secs(60));
        assert_eq!(config.session.login_timeout(), Duration::from_secs(180));
    }

    #[test]
    fn default_config_has_no_storage_override() {
        let config = WardenConfig::default();
        assert!(config.storage.data_dir.is_none());
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: WardenConfig = toml::from_str(
            r#"
[automation]
scan_interval_secs = 120
"#,
        )
        .unwrap();
        assert_eq!(config.automation.scan_interval_secs, 120);
        assert_eq!(config.automation.recent_locations_limit, 50);
        assert_eq!(config.rate_limits.auth_interval_ms, 2000);
    }

    #[test]
    fn log_level_parses_lowercase() {
        let config: WardenConfig = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.level.as_directive(), "debug");
    }
}
