//! Remote API surface for the VRChat platform.
//!
//! Provides:
//! - The [`VrchatApi`] call shapes and an HTTP implementation
//! - [`RateGate`], the shared minimum-spacing throttle
//! - [`SessionManager`], the authentication state machine

pub mod api;
pub mod client;
pub mod rate_gate;
pub mod session;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

pub use api::{
    ApiConnector, BasicCredentials, Instance, InstanceUser, PlayerModeration, TwoFactorMethod,
    UserResponse, VrchatApi,
};
pub use client::{ClientConfig, HttpApi, HttpConnector};
pub use rate_gate::RateGate;
pub use session::{AuthOutcome, AuthStatus, SessionManager, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("rate limited")]
    RateLimited,

    #[error("unauthorized (HTTP {0})")]
    Unauthorized(u16),

    #[error("not logged in")]
    NotReady,

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Transient(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl ApiError {
    /// Map a non-success HTTP status and body to an error.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            429 => ApiError::RateLimited,
            401 | 403 => ApiError::Unauthorized(status),
            _ => {
                let snippet: String = body.chars().take(200).collect();
                ApiError::Transient(format!("HTTP {status}: {snippet}"))
            }
        }
    }
}

impl From<ApiError> for warden_common::WardenError {
    fn from(e: ApiError) -> Self {
        warden_common::WardenError::Api(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::from_status(429, ""), ApiError::RateLimited);
        assert_eq!(ApiError::from_status(401, ""), ApiError::Unauthorized(401));
        assert_eq!(ApiError::from_status(403, ""), ApiError::Unauthorized(403));
        assert_eq!(
            ApiError::from_status(500, "boom"),
            ApiError::Transient("HTTP 500: boom".into())
        );
    }

    #[test]
    fn transient_body_is_truncated() {
        let body = "x".repeat(1000);
        let ApiError::Transient(msg) = ApiError::from_status(502, &body) else {
            panic!("expected transient");
        };
        assert_eq!(msg.len(), "HTTP 502: ".len() + 200);
    }
}
