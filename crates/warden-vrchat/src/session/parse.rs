//! Profile payload interpretation.
//!
//! A typed parse is tried first. When the payload does not fit the typed
//! shape, the raw JSON tree is inspected for the same three fields.

use serde::Deserialize;
use warden_common::CurrentUser;

use crate::api::TwoFactorMethod;
use crate::ApiError;

/// What a "who am I" payload says about the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    User(CurrentUser),
    TwoFactorRequired(Vec<TwoFactorMethod>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDocument {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    requires_two_factor_auth: Option<Vec<String>>,
}

pub fn parse_profile(body: &str) -> Result<Profile, ApiError> {
    let doc = match serde_json::from_str::<ProfileDocument>(body) {
        Ok(doc) => doc,
        Err(_) => scan_raw(body)?,
    };
    interpret(doc)
}

fn scan_raw(body: &str) -> Result<ProfileDocument, ApiError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))?;

    let text = |key: &str| value.get(key).and_then(|v| v.as_str()).map(str::to_string);
    let markers = value
        .get("requiresTwoFactorAuth")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect()
        });

    Ok(ProfileDocument {
        id: text("id"),
        display_name: text("displayName"),
        requires_two_factor_auth: markers,
    })
}

fn interpret(doc: ProfileDocument) -> Result<Profile, ApiError> {
    if let Some(tokens) = doc.requires_two_factor_auth.filter(|t| !t.is_empty()) {
        let mut methods = Vec::new();
        for method in tokens.iter().filter_map(|t| TwoFactorMethod::from_token(t)) {
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        return Ok(Profile::TwoFactorRequired(methods));
    }

    let id = doc
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::Parse("user payload has no id".into()))?;
    let display_name = doc
        .display_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| id.clone());

    Ok(Profile::User(CurrentUser::new(id, display_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_user() {
        let body = r#"{"id":"usr_1","displayName":"Alice","bio":"hi"}"#;
        assert_eq!(
            parse_profile(body).unwrap(),
            Profile::User(CurrentUser::new("usr_1", "Alice"))
        );
    }

    #[test]
    fn display_name_defaults_to_id() {
        let body = r#"{"id":"usr_1","displayName":"  "}"#;
        assert_eq!(
            parse_profile(body).unwrap(),
            Profile::User(CurrentUser::new("usr_1", "usr_1"))
        );
    }

    #[test]
    fn unknown_only_marker_keeps_challenge_without_methods() {
        let body = r#"{"requiresTwoFactorAuth":["sms"]}"#;
        assert_eq!(
            parse_profile(body).unwrap(),
            Profile::TwoFactorRequired(Vec::new())
        );
    }

    #[test]
    fn two_factor_marker_maps_known_tokens() {
        let body = r#"{"requiresTwoFactorAuth":["totp","EmailOtp","otp","sms","totp"]}"#;
        assert_eq!(
            parse_profile(body).unwrap(),
            Profile::TwoFactorRequired(vec![
                TwoFactorMethod::Totp,
                TwoFactorMethod::EmailOtp,
                TwoFactorMethod::RecoveryCode,
            ])
        );
    }

    #[test]
    fn empty_marker_is_not_a_requirement() {
        let body = r#"{"id":"usr_1","displayName":"Alice","requiresTwoFactorAuth":[]}"#;
        assert!(matches!(parse_profile(body).unwrap(), Profile::User(_)));
    }

    #[test]
    fn raw_fallback_handles_odd_shapes() {
        // displayName as a number and a mixed marker array defeat the typed parse
        let body = r#"{"id":"usr_9","displayName":42}"#;
        assert_eq!(
            parse_profile(body).unwrap(),
            Profile::User(CurrentUser::new("usr_9", "usr_9"))
        );

        let body = r#"{"requiresTwoFactorAuth":["emailOtp", 3]}"#;
        assert_eq!(
            parse_profile(body).unwrap(),
            Profile::TwoFactorRequired(vec![TwoFactorMethod::EmailOtp])
        );
    }

    #[test]
    fn missing_id_is_parse_error() {
        assert!(matches!(
            parse_profile(r#"{"displayName":"Alice"}"#),
            Err(ApiError::Parse(_))
        ));
        assert!(matches!(parse_profile("<html>"), Err(ApiError::Parse(_))));
        assert!(matches!(parse_profile("[]"), Err(ApiError::Parse(_))));
    }
}
