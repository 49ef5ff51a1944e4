//! Full configuration validation.
//!
//! Validates all numeric ranges and the API endpoint. Every violation is
//! collected into a single `ConfigError` so users can fix them in one pass.

mod helpers;


use crate::schema::WardenConfig;
use warden_common::ConfigError;

use helpers::{validate_non_empty, validate_range};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &WardenConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_api(&mut errors, config);
    validate_rate_limits(&mut errors, config);
    validate_automation(&mut errors, config);
    validate_session(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_api(errors: &mut Vec<String>, config: &WardenConfig) {
    let api = &config.api;
    validate_non_empty(errors, "api.user_agent", &api.user_agent);
    if !(api.base_url.starts_with("https://") || api.base_url.starts_with("http://")) {
        errors.push(format!(
            "api.base_url = {:?} must be an http(s) URL",
            api.base_url
        ));
    }
    validate_range(errors, "api.connect_timeout_secs", api.connect_timeout_secs, 1, 120);
    validate_range(errors, "api.request_timeout_secs", api.request_timeout_secs, 1, 600);
}

fn validate_rate_limits(errors: &mut Vec<String>, config: &WardenConfig) {
    let limits = &config.rate_limits;
    validate_range(errors, "rate_limits.auth_interval_ms", limits.auth_interval_ms, 100, 60_000);
    validate_range(errors, "rate_limits.api_interval_ms", limits.api_interval_ms, 100, 120_000);
}

fn validate_automation(errors: &mut Vec<String>, config: &WardenConfig) {
    let automation = &config.automation;
    validate_range(
        errors,
        "automation.scan_interval_secs",
        automation.scan_interval_secs,
        10,
        3600,
    );
    validate_range(
        errors,
        "automation.recent_locations_limit",
        automation.recent_locations_limit,
        1,
        100,
    );
}

fn validate_session(errors: &mut Vec<String>, config: &WardenConfig) {
    let session = &config.session;
    validate_range(errors, "session.restore_timeout_secs", session.restore_timeout_secs, 5, 900);
    validate_range(errors, "session.login_timeout_secs", session.login_timeout_secs, 5, 1800);
}
