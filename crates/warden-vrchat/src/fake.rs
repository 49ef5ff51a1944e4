//! Scripted [`VrchatApi`] for tests.
//!
//! Responses are configured up front; every call is recorded so tests can
//! assert on what was dispatched and in which order.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::api::{
    ApiConnector, BasicCredentials, Instance, PlayerModeration, TwoFactorMethod, UserResponse,
    VrchatApi,
};
use crate::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    GetCurrentUser,
    VerifyTwoFactor(TwoFactorMethod, String),
    Logout,
    ListBlockedModerations,
    RecentLocations { limit: u32, offset: u32 },
    GetInstance(String),
    ModerateUser(String),
}

/// Profile body for a logged-in user.
pub fn user_body(user_id: &str, display_name: &str) -> String {
    serde_json::json!({ "id": user_id, "displayName": display_name }).to_string()
}

/// Profile body demanding a second factor.
pub fn two_factor_body(tokens: &[&str]) -> String {
    serde_json::json!({ "requiresTwoFactorAuth": tokens }).to_string()
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct FakeApi {
    current_user: Mutex<VecDeque<Result<UserResponse, ApiError>>>,
    verify: Mutex<VecDeque<Result<bool, ApiError>>>,
    blocked: Mutex<Result<Vec<PlayerModeration>, ApiError>>,
    recent: Mutex<Result<Vec<String>, ApiError>>,
    instances: Mutex<HashMap<String, Result<Option<Instance>, ApiError>>>,
    moderation_failures: Mutex<HashMap<String, ApiError>>,
    jar: Mutex<Option<String>>,
    outgoing: Mutex<Option<String>>,
    calls: Mutex<Vec<ApiCall>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            current_user: Mutex::new(VecDeque::new()),
            verify: Mutex::new(VecDeque::new()),
            blocked: Mutex::new(Ok(Vec::new())),
            recent: Mutex::new(Ok(Vec::new())),
            instances: Mutex::new(HashMap::new()),
            moderation_failures: Mutex::new(HashMap::new()),
            jar: Mutex::new(None),
            outgoing: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the next "who am I" result.
    pub fn push_user(&self, result: Result<UserResponse, ApiError>) {
        lock(&self.current_user).push_back(result);
    }

    pub fn push_user_body(&self, body: impl Into<String>) {
        self.push_user(Ok(UserResponse::from_body(body)));
    }

    pub fn push_verify(&self, result: Result<bool, ApiError>) {
        lock(&self.verify).push_back(result);
    }

    pub fn set_blocked(&self, result: Result<Vec<PlayerModeration>, ApiError>) {
        *lock(&self.blocked) = result;
    }

    pub fn set_recent(&self, result: Result<Vec<String>, ApiError>) {
        *lock(&self.recent) = result;
    }

    pub fn set_instance(
        &self,
        world_id: &str,
        instance_id: &str,
        result: Result<Option<Instance>, ApiError>,
    ) {
        lock(&self.instances).insert(format!("{world_id}:{instance_id}"), result);
    }

    pub fn fail_moderation(&self, target_user_id: &str, error: ApiError) {
        lock(&self.moderation_failures).insert(target_user_id.to_string(), error);
    }

    pub fn set_jar(&self, cookie_header: Option<&str>) {
        *lock(&self.jar) = cookie_header.map(str::to_string);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, matches: impl Fn(&ApiCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| matches(c)).count()
    }

    /// Targets of every moderation call, successful or not.
    pub fn moderated(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                ApiCall::ModerateUser(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ApiCall) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl VrchatApi for FakeApi {
    async fn get_current_user(&self) -> Result<UserResponse, ApiError> {
        self.record(ApiCall::GetCurrentUser);
        lock(&self.current_user)
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transient("no scripted user response".into())))
    }

    async fn verify_two_factor(
        &self,
        method: TwoFactorMethod,
        code: &str,
    ) -> Result<bool, ApiError> {
        self.record(ApiCall::VerifyTwoFactor(method, code.to_string()));
        lock(&self.verify).pop_front().unwrap_or(Ok(true))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.record(ApiCall::Logout);
        Ok(())
    }

    async fn list_blocked_moderations(&self) -> Result<Vec<PlayerModeration>, ApiError> {
        self.record(ApiCall::ListBlockedModerations);
        lock(&self.blocked).clone()
    }

    async fn recent_locations(&self, limit: u32, offset: u32) -> Result<Vec<String>, ApiError> {
        self.record(ApiCall::RecentLocations { limit, offset });
        lock(&self.recent)
            .clone()
            .map(|all| all.into_iter().take(limit as usize).collect())
    }

    async fn get_instance(
        &self,
        world_id: &str,
        instance_id: &str,
    ) -> Result<Option<Instance>, ApiError> {
        let location = format!("{world_id}:{instance_id}");
        self.record(ApiCall::GetInstance(location.clone()));
        lock(&self.instances).get(&location).cloned().unwrap_or(Ok(None))
    }

    async fn moderate_user(&self, target_user_id: &str) -> Result<(), ApiError> {
        self.record(ApiCall::ModerateUser(target_user_id.to_string()));
        match lock(&self.moderation_failures).get(target_user_id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn jar_credential(&self) -> Option<String> {
        lock(&self.jar).clone()
    }

    fn outgoing_credential(&self) -> Option<String> {
        lock(&self.outgoing).clone()
    }

    fn set_outgoing_credential(&self, header: &str) {
        *lock(&self.outgoing) = Some(header.trim().to_string()).filter(|h| !h.is_empty());
    }
}

/// Hands out the same [`FakeApi`] for every connection.
pub struct FakeConnector {
    api: Arc<FakeApi>,
    logins: Mutex<Vec<Option<String>>>,
}

impl FakeConnector {
    pub fn new(api: Arc<FakeApi>) -> Arc<Self> {
        Arc::new(Self {
            api,
            logins: Mutex::new(Vec::new()),
        })
    }

    /// Username of every connection made, `None` for credential-less ones.
    pub fn logins(&self) -> Vec<Option<String>> {
        lock(&self.logins).clone()
    }
}

impl ApiConnector for FakeConnector {
    fn connect(
        &self,
        credentials: Option<BasicCredentials>,
    ) -> Result<Arc<dyn VrchatApi>, ApiError> {
        lock(&self.logins).push(credentials.map(|c| c.username));
        Ok(Arc::clone(&self.api) as Arc<dyn VrchatApi>)
    }
}
