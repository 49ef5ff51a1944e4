//! Reconciliation loop and session timeout configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Background reconciliation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Start the scan loop automatically once logged in.
    pub enabled: bool,
    /// Seconds between scans (valid range: 10-3600).
    pub scan_interval_secs: u32,
    /// How many recent locations to inspect per scan (valid range: 1-100).
    pub recent_locations_limit: u32,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scan_interval_secs: 60,
            recent_locations_limit: 50,
        }
    }
}

impl AutomationConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.scan_interval_secs))
    }
}

/// Upper bounds for interactive session operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub restore_timeout_secs: u32,
    pub login_timeout_secs: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            restore_timeout_secs: 60,
            login_timeout_secs: 180,
        }
    }
}

impl SessionConfig {
    pub fn restore_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.restore_timeout_secs))
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.login_timeout_secs))
    }
}
