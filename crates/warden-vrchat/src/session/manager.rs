//! SessionManager: login, two-factor, restore and logout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use warden_common::{CurrentUser, SessionEvent, SessionEventBus};
use warden_platform::CookieStore;

use crate::api::{ApiConnector, BasicCredentials, TwoFactorMethod, UserResponse, VrchatApi};
use crate::rate_gate::RateGate;
use crate::ApiError;

use super::credentials::extract_credential;
use super::messages;
use super::parse::{parse_profile, Profile};
use super::types::{AuthOutcome, SessionState};

/// Where the session is, with the context that belongs to that phase.
enum Phase {
    LoggedOut,
    AwaitingTwoFactor {
        api: Arc<dyn VrchatApi>,
        methods: Vec<TwoFactorMethod>,
    },
    LoggedIn {
        api: Arc<dyn VrchatApi>,
        user: CurrentUser,
    },
}

impl Phase {
    fn state(&self) -> SessionState {
        match self {
            Phase::LoggedOut => SessionState::LoggedOut,
            Phase::AwaitingTwoFactor { .. } => SessionState::AwaitingTwoFactor,
            Phase::LoggedIn { .. } => SessionState::LoggedIn,
        }
    }

    fn event(&self) -> SessionEvent {
        match self {
            Phase::LoggedOut => SessionEvent::LoggedOut,
            Phase::AwaitingTwoFactor { methods, .. } => SessionEvent::TwoFactorRequired {
                methods: methods.iter().map(|m| m.token().to_string()).collect(),
            },
            Phase::LoggedIn { user, .. } => SessionEvent::LoggedIn(user.clone()),
        }
    }
}

struct Inner {
    phase: Phase,
    raw_profile: Option<String>,
}

/// Authentication state machine over one remote account.
///
/// Only this type mutates readiness. Readers (`is_ready`, `current_user`,
/// `api`) never block on a running authentication step.
pub struct SessionManager {
    connector: Arc<dyn ApiConnector>,
    auth_gate: Arc<RateGate>,
    cookies: Arc<dyn CookieStore>,
    events: SessionEventBus,
    /// Serializes authentication steps.
    auth_lock: Mutex<()>,
    inner: RwLock<Inner>,
}

impl SessionManager {
    pub fn new(
        connector: Arc<dyn ApiConnector>,
        auth_gate: Arc<RateGate>,
        cookies: Arc<dyn CookieStore>,
        events: SessionEventBus,
    ) -> Self {
        Self {
            connector,
            auth_gate,
            cookies,
            events,
            auth_lock: Mutex::new(()),
            inner: RwLock::new(Inner {
                phase: Phase::LoggedOut,
                raw_profile: None,
            }),
        }
    }

    pub fn events(&self) -> &SessionEventBus {
        &self.events
    }

    pub async fn state(&self) -> SessionState {
        self.inner.read().await.phase.state()
    }

    pub async fn is_ready(&self) -> bool {
        self.state().await == SessionState::LoggedIn
    }

    /// Identity from the last successful authentication step. No network.
    pub async fn current_user(&self) -> Option<CurrentUser> {
        match &self.inner.read().await.phase {
            Phase::LoggedIn { user, .. } => Some(user.clone()),
            _ => None,
        }
    }

    /// Last raw profile payload, kept for display.
    pub async fn raw_profile(&self) -> Option<String> {
        self.inner.read().await.raw_profile.clone()
    }

    /// The ready remote-call context.
    pub async fn api(&self) -> Result<Arc<dyn VrchatApi>, ApiError> {
        match &self.inner.read().await.phase {
            Phase::LoggedIn { api, .. } => Ok(Arc::clone(api)),
            _ => Err(ApiError::NotReady),
        }
    }

    /// Resume from the persisted credential.
    pub async fn try_restore_session(&self, cancel: &CancellationToken) -> AuthOutcome {
        let _auth = self.auth_lock.lock().await;

        let stored = match self.cookies.load().await {
            Ok(Some(cookie)) => cookie,
            Ok(None) => return AuthOutcome::failed(messages::NO_SAVED_SESSION),
            Err(e) => {
                warn!(error = %e, "could not read saved session");
                return AuthOutcome::failed(messages::NO_SAVED_SESSION);
            }
        };

        let api = match self.connector.connect(None) {
            Ok(api) => api,
            Err(e) => return AuthOutcome::failed(e.to_string()),
        };
        api.set_outgoing_credential(&stored);
        debug!(len = stored.len(), "restoring session from saved credential");

        let response = match self.auth_gate.run(cancel, || api.get_current_user()).await {
            Ok(response) => response,
            Err(ApiError::Unauthorized(status)) => {
                info!(status, "saved session rejected");
                self.forget_credential().await;
                self.enter(Phase::LoggedOut, None).await;
                return AuthOutcome::failed(messages::SESSION_EXPIRED);
            }
            Err(ApiError::RateLimited) => {
                warn!("rate limited while restoring session");
                return AuthOutcome::failed(messages::RESTORE_RATE_LIMITED);
            }
            Err(e) => return failure(e),
        };

        match parse_profile(&response.body) {
            Ok(Profile::User(user)) => {
                self.persist_credential(&response, api.as_ref()).await;
                self.enter(Phase::LoggedIn { api, user }, Some(response.body))
                    .await;
                AuthOutcome::success()
            }
            Ok(Profile::TwoFactorRequired(_)) | Err(_) => {
                info!("saved session no longer authenticates");
                self.forget_credential().await;
                AuthOutcome::failed(messages::SESSION_INVALID)
            }
        }
    }

    /// Authenticate with username and password.
    ///
    /// A two-factor requirement leaves the session in `AwaitingTwoFactor`
    /// with the context kept for [`Self::submit_two_factor`].
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> AuthOutcome {
        let _auth = self.auth_lock.lock().await;

        if self.state().await == SessionState::LoggedIn {
            return AuthOutcome::failed(messages::ALREADY_LOGGED_IN);
        }

        let api = match self
            .connector
            .connect(Some(BasicCredentials::new(username, password)))
        {
            Ok(api) => api,
            Err(e) => return AuthOutcome::failed(e.to_string()),
        };
        match self.cookies.load().await {
            Ok(Some(stored)) => api.set_outgoing_credential(&stored),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "ignoring unreadable saved session"),
        }

        info!(username, "logging in");
        match self.auth_gate.run(cancel, || api.get_current_user()).await {
            Ok(response) => {
                self.complete_authentication(api, response, messages::LOGIN_UNPARSEABLE)
                    .await
            }
            Err(ApiError::RateLimited) => {
                warn!("rate limited during login");
                AuthOutcome::failed(messages::LOGIN_RATE_LIMITED)
            }
            Err(e) => failure(e),
        }
    }

    /// Answer the pending two-factor challenge.
    pub async fn submit_two_factor(
        &self,
        method: TwoFactorMethod,
        code: &str,
        cancel: &CancellationToken,
    ) -> AuthOutcome {
        let _auth = self.auth_lock.lock().await;

        let api = match &self.inner.read().await.phase {
            Phase::AwaitingTwoFactor { api, .. } => Arc::clone(api),
            Phase::LoggedIn { .. } => return AuthOutcome::success(),
            Phase::LoggedOut => return AuthOutcome::failed(messages::NOT_LOGGED_IN),
        };

        let code = code.trim();
        if code.is_empty() {
            return AuthOutcome::failed(messages::CODE_REQUIRED);
        }

        match self
            .auth_gate
            .run(cancel, || api.verify_two_factor(method, code))
            .await
        {
            Ok(verified) => debug!(method = method.token(), verified, "two-factor code submitted"),
            Err(ApiError::RateLimited) => return AuthOutcome::failed(messages::LOGIN_RATE_LIMITED),
            Err(ApiError::Cancelled) => return AuthOutcome::failed(messages::OPERATION_CANCELLED),
            // A rejected code still falls through to the profile check,
            // which reports whether the challenge remains.
            Err(e) => warn!(method = method.token(), error = %e, "two-factor verification failed"),
        }

        match self.auth_gate.run(cancel, || api.get_current_user()).await {
            Ok(response) => {
                self.complete_authentication(api, response, messages::TWO_FACTOR_UNPARSEABLE)
                    .await
            }
            Err(ApiError::RateLimited) => AuthOutcome::failed(messages::LOGIN_RATE_LIMITED),
            Err(e) => failure(e),
        }
    }

    /// Clear the credential, best-effort remote logout, drop the context.
    pub async fn logout(&self, cancel: &CancellationToken) {
        let _auth = self.auth_lock.lock().await;

        self.forget_credential().await;

        let api = match &self.inner.read().await.phase {
            Phase::AwaitingTwoFactor { api, .. } | Phase::LoggedIn { api, .. } => {
                Some(Arc::clone(api))
            }
            Phase::LoggedOut => None,
        };
        if let Some(api) = api {
            if let Err(e) = self.auth_gate.run(cancel, || api.logout()).await {
                debug!(error = %e, "remote logout failed");
            }
        }

        self.enter(Phase::LoggedOut, None).await;
    }

    async fn complete_authentication(
        &self,
        api: Arc<dyn VrchatApi>,
        response: UserResponse,
        unparseable: &str,
    ) -> AuthOutcome {
        match parse_profile(&response.body) {
            Ok(Profile::TwoFactorRequired(methods)) if methods.is_empty() => {
                warn!("two-factor required but no supported method offered");
                AuthOutcome::failed(messages::TWO_FACTOR_UNSUPPORTED)
            }
            Ok(Profile::TwoFactorRequired(methods)) => {
                let still_waiting = self.state().await == SessionState::AwaitingTwoFactor;
                info!(?methods, "two-factor authentication required");
                self.enter(
                    Phase::AwaitingTwoFactor {
                        api,
                        methods: methods.clone(),
                    },
                    Some(response.body),
                )
                .await;

                let outcome = AuthOutcome::requires_two_factor(methods);
                if still_waiting {
                    outcome.with_message(messages::TWO_FACTOR_STILL_REQUIRED)
                } else {
                    outcome
                }
            }
            Ok(Profile::User(user)) => {
                self.persist_credential(&response, api.as_ref()).await;
                self.enter(Phase::LoggedIn { api, user }, Some(response.body))
                    .await;
                AuthOutcome::success()
            }
            Err(e) => {
                warn!(error = %e, "user payload not understood");
                AuthOutcome::failed(unparseable)
            }
        }
    }

    async fn persist_credential(&self, response: &UserResponse, api: &dyn VrchatApi) {
        let Some(header) = extract_credential(response, api) else {
            debug!("no credential to persist");
            return;
        };
        if let Err(e) = self.cookies.save(&header).await {
            warn!(error = %e, "failed to persist session credential");
        }
        api.set_outgoing_credential(&header);
    }

    async fn forget_credential(&self) {
        if let Err(e) = self.cookies.clear().await {
            warn!(error = %e, "failed to clear session credential");
        }
    }

    async fn enter(&self, next: Phase, raw_profile: Option<String>) {
        let event = next.event();
        let to = next.state();
        let from = {
            let mut inner = self.inner.write().await;
            let from = inner.phase.state();
            inner.phase = next;
            if raw_profile.is_some() || to == SessionState::LoggedOut {
                inner.raw_profile = raw_profile;
            }
            from
        };

        if !from.can_transition_to(to) {
            warn!(%from, %to, "unexpected session transition");
        }
        match &event {
            SessionEvent::LoggedIn(user) => {
                info!(user_id = %user.user_id, display_name = %user.display_name, "logged in")
            }
            _ => info!(%from, %to, "session state changed"),
        }
        self.events.publish(event);
    }
}

fn failure(error: ApiError) -> AuthOutcome {
    match error {
        ApiError::Cancelled => AuthOutcome::failed(messages::OPERATION_CANCELLED),
        other => AuthOutcome::failed(other.to_string()),
    }
}

/// Run an authentication step with a deadline.
///
/// On expiry `cancel` is triggered and the step reports cancellation.
pub async fn bounded<F>(timeout: Duration, cancel: &CancellationToken, step: F) -> AuthOutcome
where
    F: Future<Output = AuthOutcome>,
{
    match tokio::time::timeout(timeout, step).await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(timeout_secs = timeout.as_secs(), "authentication step timed out");
            cancel.cancel();
            AuthOutcome::failed(messages::OPERATION_CANCELLED)
        }
    }
}
