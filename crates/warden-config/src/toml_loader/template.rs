//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Warden Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[api]
# base_url = "https://api.vrchat.cloud/api/1"
# user_agent = "InstanceWarden/0.1.0 github"
# connect_timeout_secs = 10   # 1-120
# request_timeout_secs = 30   # 1-600

[rate_limits]
# Minimum spacing between calls. Login and two-factor calls use the auth gate.
# auth_interval_ms = 2000     # 100-60000
# api_interval_ms = 1000      # 100-120000

[automation]
# enabled = true
# scan_interval_secs = 60     # 10-3600
# recent_locations_limit = 50 # 1-100

[session]
# restore_timeout_secs = 60   # 5-900
# login_timeout_secs = 180    # 5-1800

[storage]
# data_dir = "/path/to/state"

[logging]
# level = "info"              # debug, info, warning, error
"##
    .to_string()
}
