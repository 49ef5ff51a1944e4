//! Abstract remote call shapes and their payload models.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ApiError;

/// Raw result of the "who am I" call.
///
/// The body is kept verbatim; interpretation is the session's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserResponse {
    pub body: String,
    /// `name=value` pairs from the response's parsed cookies.
    pub cookies: Vec<String>,
    /// Raw `Set-Cookie` header values.
    pub set_cookie: Vec<String>,
}

impl UserResponse {
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }
}

/// A second authentication factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TwoFactorMethod {
    Totp,
    EmailOtp,
    RecoveryCode,
}

impl TwoFactorMethod {
    /// Map a marker token from the profile payload, ignoring case.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "totp" => Some(Self::Totp),
            "emailotp" => Some(Self::EmailOtp),
            "otp" => Some(Self::RecoveryCode),
            _ => None,
        }
    }

    /// Token as it appears in the profile payload.
    pub fn token(self) -> &'static str {
        match self {
            Self::Totp => "totp",
            Self::EmailOtp => "emailOtp",
            Self::RecoveryCode => "otp",
        }
    }

    /// Path segment of the verification endpoint.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Totp => "totp",
            Self::EmailOtp => "emailotp",
            Self::RecoveryCode => "otp",
        }
    }
}

impl fmt::Display for TwoFactorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Totp => f.write_str("authenticator app code"),
            Self::EmailOtp => f.write_str("email code"),
            Self::RecoveryCode => f.write_str("recovery code"),
        }
    }
}

impl FromStr for TwoFactorMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(Self::EmailOtp),
            "recovery" => Ok(Self::RecoveryCode),
            other => Self::from_token(other).ok_or_else(|| format!("unknown 2FA method: {s}")),
        }
    }
}

/// One entry of the player-moderation list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerModeration {
    pub target_user_id: String,
    pub target_display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceUser {
    pub id: String,
    pub display_name: Option<String>,
}

/// Snapshot of a remote instance.
///
/// `hidden`, `friends` and `private` carry the owner's user id for the
/// matching privacy variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Instance {
    pub world_id: String,
    pub instance_id: String,
    pub id: String,
    pub location: String,
    pub active: bool,
    pub owner_id: Option<String>,
    pub hidden: Option<String>,
    pub friends: Option<String>,
    pub private: Option<String>,
    pub users: Vec<InstanceUser>,
    pub display_name: Option<String>,
    pub name: Option<String>,
    pub user_count: u32,
    pub capacity: u32,
}

impl Instance {
    /// Human-readable name: display name, then world name, then location.
    pub fn label(&self) -> &str {
        first_non_blank([
            self.display_name.as_deref(),
            self.name.as_deref(),
            Some(self.location.as_str()),
        ])
        .unwrap_or_default()
    }

    /// Instance id, falling back to `id` and then `location`.
    pub fn key(&self) -> &str {
        first_non_blank([
            Some(self.instance_id.as_str()),
            Some(self.id.as_str()),
            Some(self.location.as_str()),
        ])
        .unwrap_or_default()
    }
}

fn first_non_blank<'a>(candidates: [Option<&'a str>; 3]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
}

/// Username and password for basic authentication.
#[derive(Clone)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A remote-call context. One instance carries one identity.
#[async_trait]
pub trait VrchatApi: Send + Sync {
    /// "Who am I". Authenticates as a side effect when basic credentials
    /// are attached.
    async fn get_current_user(&self) -> Result<UserResponse, ApiError>;

    /// Returns whether the server accepted the code.
    async fn verify_two_factor(
        &self,
        method: TwoFactorMethod,
        code: &str,
    ) -> Result<bool, ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;

    /// Moderations of type "block" issued by the current user.
    async fn list_blocked_moderations(&self) -> Result<Vec<PlayerModeration>, ApiError>;

    /// Recently active locations as `worldId:instanceId` strings.
    async fn recent_locations(&self, limit: u32, offset: u32) -> Result<Vec<String>, ApiError>;

    /// `Ok(None)` when the instance does not exist.
    async fn get_instance(
        &self,
        world_id: &str,
        instance_id: &str,
    ) -> Result<Option<Instance>, ApiError>;

    /// Issue a "block" moderation against the target.
    async fn moderate_user(&self, target_user_id: &str) -> Result<(), ApiError>;

    /// Cookie header the underlying client would send, from its jar.
    fn jar_credential(&self) -> Option<String>;

    /// Explicit credential header attached to every request.
    fn outgoing_credential(&self) -> Option<String>;

    fn set_outgoing_credential(&self, header: &str);
}

/// Builds fresh remote-call contexts.
pub trait ApiConnector: Send + Sync {
    fn connect(
        &self,
        credentials: Option<BasicCredentials>,
    ) -> Result<Arc<dyn VrchatApi>, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_tokens_ignore_case() {
        assert_eq!(TwoFactorMethod::from_token("emailOtp"), Some(TwoFactorMethod::EmailOtp));
        assert_eq!(TwoFactorMethod::from_token("EMAILOTP"), Some(TwoFactorMethod::EmailOtp));
        assert_eq!(TwoFactorMethod::from_token("totp"), Some(TwoFactorMethod::Totp));
        assert_eq!(TwoFactorMethod::from_token("otp"), Some(TwoFactorMethod::RecoveryCode));
        assert_eq!(TwoFactorMethod::from_token("sms"), None);
    }

    #[test]
    fn method_from_str_accepts_aliases() {
        assert_eq!("email".parse::<TwoFactorMethod>(), Ok(TwoFactorMethod::EmailOtp));
        assert_eq!("recovery".parse::<TwoFactorMethod>(), Ok(TwoFactorMethod::RecoveryCode));
        assert_eq!("TOTP".parse::<TwoFactorMethod>(), Ok(TwoFactorMethod::Totp));
        assert!("sms".parse::<TwoFactorMethod>().is_err());
    }

    #[test]
    fn instance_parses_partial_payload() {
        let json = r#"{
            "worldId": "wrld_1",
            "instanceId": "123~private(usr_a)",
            "active": true,
            "private": "usr_a",
            "users": [{"id": "usr_b", "displayName": "Bob"}],
            "userCount": 2,
            "unknownField": 5
        }"#;
        let instance: Instance = serde_json::from_str(json).unwrap();
        assert!(instance.active);
        assert_eq!(instance.private.as_deref(), Some("usr_a"));
        assert!(instance.owner_id.is_none());
        assert_eq!(instance.users[0].display_name.as_deref(), Some("Bob"));
        assert_eq!(instance.user_count, 2);
    }

    #[test]
    fn instance_label_and_key_fall_back() {
        let mut instance = Instance {
            location: "wrld_1:123".into(),
            ..Instance::default()
        };
        assert_eq!(instance.label(), "wrld_1:123");
        assert_eq!(instance.key(), "wrld_1:123");

        instance.name = Some("Cozy World".into());
        instance.id = "wrld_1:123~id".into();
        assert_eq!(instance.label(), "Cozy World");
        assert_eq!(instance.key(), "wrld_1:123~id");

        instance.display_name = Some("My Room".into());
        instance.instance_id = "123".into();
        assert_eq!(instance.label(), "My Room");
        assert_eq!(instance.key(), "123");
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = BasicCredentials::new("bob", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("bob"));
        assert!(!debug.contains("hunter2"));
    }
}
