//! `reqwest`-backed remote-call context.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use base64::Engine;
use reqwest::cookie::{CookieStore as _, Jar};
use reqwest::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

use crate::api::{
    ApiConnector, BasicCredentials, Instance, PlayerModeration, TwoFactorMethod, UserResponse,
    VrchatApi,
};
use crate::ApiError;

use super::ClientConfig;

/// One HTTP identity: its own client, cookie jar and outgoing credential.
pub struct HttpApi {
    config: ClientConfig,
    http: reqwest::Client,
    jar: Arc<Jar>,
    basic_auth: Option<String>,
    outgoing: RwLock<Option<String>>,
}

impl HttpApi {
    pub fn new(
        config: ClientConfig,
        credentials: Option<BasicCredentials>,
    ) -> Result<Self, ApiError> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Transient(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http,
            jar,
            basic_auth: credentials.as_ref().map(basic_auth_header),
            outgoing: RwLock::new(None),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.config.url(path);
        let cookie = self.cookie_header(&url);
        let mut req = self.http.request(method, url);
        if let Some(basic) = &self.basic_auth {
            req = req.header(AUTHORIZATION, basic);
        }
        if let Some(cookie) = cookie {
            req = req.header(COOKIE, cookie);
        }
        req
    }

    /// The outgoing credential, with cookies the server has issued since
    /// replacing saved values of the same name.
    ///
    /// An explicit `Cookie` header stops reqwest from adding the jar, so the
    /// two are merged here. Without an outgoing credential the jar applies
    /// on its own.
    fn cookie_header(&self, url: &str) -> Option<String> {
        let saved = self.outgoing_credential()?;
        let issued = reqwest::Url::parse(url)
            .ok()
            .and_then(|url| self.jar.cookies(&url))
            .and_then(|v| v.to_str().ok().map(str::to_string));
        Some(match issued {
            Some(issued) => merge_cookies(&saved, &issued),
            None => saved,
        })
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), &body))
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        req: RequestBuilder,
    ) -> Result<T, ApiError> {
        let resp = self.send(req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

/// `Basic base64(urlencode(user):urlencode(pass))`
fn basic_auth_header(credentials: &BasicCredentials) -> String {
    let raw = format!(
        "{}:{}",
        urlencoding::encode(&credentials.username),
        urlencoding::encode(&credentials.password)
    );
    format!("Basic {}", base64::engine::general_purpose::STANDARD.encode(raw))
}

fn cookie_pairs(header: &str) -> impl Iterator<Item = (&str, &str)> + '_ {
    header.split(';').filter_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        let name = name.trim();
        (!name.is_empty()).then_some((name, value.trim()))
    })
}

/// `name=value` pairs of `saved`, overridden and extended by `issued`.
fn merge_cookies(saved: &str, issued: &str) -> String {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (name, value) in cookie_pairs(saved).chain(cookie_pairs(issued)) {
        match pairs.iter_mut().find(|(existing, _)| existing.as_str() == name) {
            Some(pair) => pair.1 = value.to_string(),
            None => pairs.push((name.to_string(), value.to_string())),
        }
    }
    pairs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    verified: bool,
}

#[async_trait]
impl VrchatApi for HttpApi {
    async fn get_current_user(&self) -> Result<UserResponse, ApiError> {
        let resp = self.send(self.request(Method::GET, "/auth/user")).await?;

        let cookies = resp
            .cookies()
            .map(|c| format!("{}={}", c.name(), c.value()))
            .collect();
        let set_cookie = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        Ok(UserResponse {
            body,
            cookies,
            set_cookie,
        })
    }

    async fn verify_two_factor(
        &self,
        method: TwoFactorMethod,
        code: &str,
    ) -> Result<bool, ApiError> {
        let path = format!("/auth/twofactorauth/{}/verify", method.endpoint());
        let req = self
            .request(Method::POST, &path)
            .json(&serde_json::json!({ "code": code }));
        let verify: VerifyResponse = self.send_json(req).await?;
        debug!(method = method.token(), verified = verify.verified, "two-factor verify");
        Ok(verify.verified)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.send(self.request(Method::PUT, "/logout")).await?;
        Ok(())
    }

    async fn list_blocked_moderations(&self) -> Result<Vec<PlayerModeration>, ApiError> {
        let req = self
            .request(Method::GET, "/auth/user/playermoderations")
            .query(&[("type", "block")]);
        self.send_json(req).await
    }

    async fn recent_locations(&self, limit: u32, offset: u32) -> Result<Vec<String>, ApiError> {
        let req = self
            .request(Method::GET, "/instances/recent")
            .query(&[("n", limit), ("offset", offset)]);
        self.send_json(req).await
    }

    async fn get_instance(
        &self,
        world_id: &str,
        instance_id: &str,
    ) -> Result<Option<Instance>, ApiError> {
        let path = format!(
            "/instances/{}:{}",
            urlencoding::encode(world_id),
            urlencoding::encode(instance_id)
        );
        let resp = self
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        resp.json::<Instance>()
            .await
            .map(Some)
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn moderate_user(&self, target_user_id: &str) -> Result<(), ApiError> {
        let req = self
            .request(Method::POST, "/auth/user/playermoderations")
            .json(&serde_json::json!({ "moderated": target_user_id, "type": "block" }));
        self.send(req).await?;
        Ok(())
    }

    fn jar_credential(&self) -> Option<String> {
        let url = reqwest::Url::parse(&self.config.base_url).ok()?;
        self.jar
            .cookies(&url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
            .filter(|v| !v.trim().is_empty())
    }

    fn outgoing_credential(&self) -> Option<String> {
        self.outgoing
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_outgoing_credential(&self, header: &str) {
        let header = header.trim();
        *self.outgoing.write().unwrap_or_else(PoisonError::into_inner) =
            Some(header.to_string()).filter(|h| !h.is_empty());
    }
}

/// Builds [`HttpApi`] contexts from one shared configuration.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    config: ClientConfig,
}

impl HttpConnector {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl ApiConnector for HttpConnector {
    fn connect(
        &self,
        credentials: Option<BasicCredentials>,
    ) -> Result<Arc<dyn VrchatApi>, ApiError> {
        Ok(Arc::new(HttpApi::new(self.config.clone(), credentials)?))
    }
}
