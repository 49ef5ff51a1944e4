use std::fmt;

use crate::api::TwoFactorMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    LoggedOut,
    AwaitingTwoFactor,
    LoggedIn,
}

impl SessionState {
    /// Allowed transitions. Logout and fatal failures return to
    /// `LoggedOut` from anywhere; a ready session is never demoted to
    /// awaiting a second factor.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (_, LoggedOut) => true,
            (LoggedOut | AwaitingTwoFactor, AwaitingTwoFactor) => true,
            (_, LoggedIn) => true,
            (LoggedIn, AwaitingTwoFactor) => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::LoggedOut => f.write_str("logged out"),
            SessionState::AwaitingTwoFactor => f.write_str("awaiting two-factor code"),
            SessionState::LoggedIn => f.write_str("logged in"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Success,
    RequiresTwoFactor,
    Failed,
}

/// Result of any authentication step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub status: AuthStatus,
    pub error_message: Option<String>,
    /// Only set when `status` is `RequiresTwoFactor`.
    pub required_methods: Option<Vec<TwoFactorMethod>>,
}

impl AuthOutcome {
    pub fn success() -> Self {
        Self {
            status: AuthStatus::Success,
            error_message: None,
            required_methods: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: AuthStatus::Failed,
            error_message: Some(message.into()),
            required_methods: None,
        }
    }

    pub fn requires_two_factor(methods: Vec<TwoFactorMethod>) -> Self {
        Self {
            status: AuthStatus::RequiresTwoFactor,
            error_message: None,
            required_methods: Some(methods),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == AuthStatus::Success
    }

    pub fn methods(&self) -> &[TwoFactorMethod] {
        self.required_methods.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionState::*;

    #[test]
    fn transition_table() {
        assert!(LoggedOut.can_transition_to(AwaitingTwoFactor));
        assert!(LoggedOut.can_transition_to(LoggedIn));
        assert!(AwaitingTwoFactor.can_transition_to(AwaitingTwoFactor));
        assert!(AwaitingTwoFactor.can_transition_to(LoggedIn));
        assert!(AwaitingTwoFactor.can_transition_to(LoggedOut));
        assert!(LoggedIn.can_transition_to(LoggedOut));
        assert!(LoggedIn.can_transition_to(LoggedIn));
        assert!(!LoggedIn.can_transition_to(AwaitingTwoFactor));
    }

    #[test]
    fn outcome_constructors() {
        assert!(AuthOutcome::success().is_success());

        let failed = AuthOutcome::failed("nope");
        assert_eq!(failed.status, AuthStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("nope"));
        assert!(failed.methods().is_empty());

        let tfa = AuthOutcome::requires_two_factor(vec![TwoFactorMethod::Totp]);
        assert_eq!(tfa.methods(), &[TwoFactorMethod::Totp]);
        assert!(tfa.error_message.is_none());
    }
}
