//! Domain types shared by the session, storage, and automation crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the logged-in account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub user_id: String,
    pub display_name: String,
}

impl CurrentUser {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// A blocked account. Identity is `user_id`; the display name is cosmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedUser {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl BlockedUser {
    pub fn new(user_id: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.filter(|n| !n.trim().is_empty()),
        }
    }

    /// Display name if known, otherwise the user id.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.user_id)
    }
}

/// Which block lists feed the effective block set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlockSourceMode {
    VrchatOnly,
    CustomOnly,
    #[default]
    Both,
}

impl BlockSourceMode {
    pub fn includes_remote(self) -> bool {
        matches!(self, BlockSourceMode::VrchatOnly | BlockSourceMode::Both)
    }

    pub fn includes_custom(self) -> bool {
        matches!(self, BlockSourceMode::CustomOnly | BlockSourceMode::Both)
    }
}

/// Outcome recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KickAction {
    Kicked,
    Failed,
}

impl fmt::Display for KickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KickAction::Kicked => f.write_str("kicked"),
            KickAction::Failed => f.write_str("failed"),
        }
    }
}

/// One append-only audit record written by the reconciliation scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickLogEntry {
    pub timestamp: DateTime<Utc>,
    pub world_id: String,
    pub instance_id: String,
    #[serde(default)]
    pub instance_name: Option<String>,
    pub player_id: String,
    #[serde(default)]
    pub player_display_name: Option<String>,
    pub action: KickAction,
    #[serde(default)]
    pub details: Option<String>,
}

impl KickLogEntry {
    pub fn player_label(&self) -> &str {
        non_blank(self.player_display_name.as_deref()).unwrap_or(&self.player_id)
    }

    pub fn instance_label(&self) -> &str {
        non_blank(self.instance_name.as_deref()).unwrap_or(&self.instance_id)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> KickLogEntry {
        KickLogEntry {
            timestamp: "2026-01-02T03:04:05Z".parse().unwrap(),
            world_id: "wrld_1".into(),
            instance_id: "12345~private(usr_a)".into(),
            instance_name: None,
            player_id: "usr_b".into(),
            player_display_name: Some("Bob".into()),
            action: KickAction::Kicked,
            details: None,
        }
    }

    #[test]
    fn kick_log_entry_uses_camel_case_fields() {
        let json = serde_json::to_value(entry()).unwrap();
        assert_eq!(json["worldId"], "wrld_1");
        assert_eq!(json["playerId"], "usr_b");
        assert_eq!(json["playerDisplayName"], "Bob");
        assert_eq!(json["action"], "kicked");
    }

    #[test]
    fn kick_log_entry_parses_with_missing_optionals() {
        let line = r#"{"timestamp":"2026-01-02T03:04:05Z","worldId":"w","instanceId":"i","playerId":"p","action":"failed"}"#;
        let parsed: KickLogEntry = serde_json::from_str(line).unwrap();
        assert_eq!(parsed.action, KickAction::Failed);
        assert!(parsed.details.is_none());
        assert_eq!(parsed.player_label(), "p");
        assert_eq!(parsed.instance_label(), "i");
    }

    #[test]
    fn labels_prefer_names() {
        let mut e = entry();
        e.instance_name = Some("Cozy Room".into());
        assert_eq!(e.player_label(), "Bob");
        assert_eq!(e.instance_label(), "Cozy Room");

        e.player_display_name = Some("   ".into());
        assert_eq!(e.player_label(), "usr_b");
    }

    #[test]
    fn blocked_user_drops_blank_display_name() {
        let user = BlockedUser::new("usr_1", Some("  ".into()));
        assert!(user.display_name.is_none());
        assert_eq!(user.label(), "usr_1");
    }

    #[test]
    fn block_source_mode_membership() {
        assert!(BlockSourceMode::Both.includes_remote());
        assert!(BlockSourceMode::Both.includes_custom());
        assert!(BlockSourceMode::VrchatOnly.includes_remote());
        assert!(!BlockSourceMode::VrchatOnly.includes_custom());
        assert!(!BlockSourceMode::CustomOnly.includes_remote());
        assert!(BlockSourceMode::CustomOnly.includes_custom());
    }

    #[test]
    fn kick_action_display() {
        assert_eq!(KickAction::Kicked.to_string(), "kicked");
        assert_eq!(KickAction::Failed.to_string(), "failed");
    }
}
