//! Remote API and rate-limit configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Remote API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// The platform rejects requests without an identifying user agent.
    pub user_agent: String,
    /// Connect timeout in seconds (valid range: 1-120).
    pub connect_timeout_secs: u32,
    /// Whole-request timeout in seconds (valid range: 1-600).
    pub request_timeout_secs: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.vrchat.cloud/api/1".into(),
            user_agent: format!("InstanceWarden/{} github", env!("CARGO_PKG_VERSION")),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.connect_timeout_secs))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.request_timeout_secs))
    }
}

/// Minimum spacing between successive remote calls, per call class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Login, two-factor, restore and logout calls (valid range: 100-60000).
    pub auth_interval_ms: u32,
    /// Every other API call (valid range: 100-120000).
    pub api_interval_ms: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            auth_interval_ms: 2000,
            api_interval_ms: 1000,
        }
    }
}

impl RateLimitConfig {
    pub fn auth_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.auth_interval_ms))
    }

    pub fn api_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.api_interval_ms))
    }
}
