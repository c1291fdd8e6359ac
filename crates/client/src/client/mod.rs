//! TaskMate HTTP client
//!
//! [`ApiClient`] is the single egress point to the task API. Every request
//! is bearer-authenticated from the injected [`SessionStore`], and a `401`
//! on the first attempt of a call triggers exactly one credential renewal
//! followed by exactly one retry:
//!
//! ```text
//! SENDING  -> 2xx                       -> DONE
//!          -> 401 on first attempt      -> RENEWING
//!          -> other non-2xx             -> FAILED (Http)
//! RENEWING -> renewal ok                -> RETRYING
//!          -> renewal fails / no refresh -> LOGGED_OUT (SessionExpired)
//! RETRYING -> 2xx                       -> DONE
//!          -> any non-2xx               -> FAILED (Http)
//! ```
//!
//! Reaching `LOGGED_OUT` wipes the session store and asks the [`Navigator`]
//! to move to the login path.

pub mod auth;
pub mod error;
pub mod tasks;

use std::sync::Arc;
use std::time::Duration;

use error::ClientError;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::session::{MemorySessionStore, SessionStore};
use crate::token;
use crate::types::{RefreshRequest, RefreshResponse};

/// Ceiling applied to every request unless overridden
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the application is sent after an unrecoverable session failure
pub const DEFAULT_LOGIN_PATH: &str = "/login";

const REFRESH_PATH: &str = "token/refresh/";

/// Receives the logged-out transition
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, path: &str) {
        self(path);
    }
}

/// Navigator that ignores navigation requests
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _path: &str) {}
}

/// How concurrent renewals are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenewalMode {
    /// Every failing call renews on its own
    PerRequest,
    /// Concurrent failing calls share one renewal exchange
    #[default]
    Coalesced,
}

/// Per-call request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: HeaderMap,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header that overrides the client's defaults for this call
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Which attempt of a logical call is being sent
#[derive(Debug, Clone, PartialEq, Eq)]
enum Attempt {
    First,
    Retry { access: String },
}

/// TaskMate API client
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    renewal: RenewalMode,
    renewal_lock: Mutex<()>,
}

impl ApiClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// The session store backing this client
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.inner.session
    }

    pub fn login_path(&self) -> &str {
        &self.inner.login_path
    }

    /// `GET` a JSON resource
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(Method::GET, path, None::<&()>, RequestOptions::default())
            .await
    }

    /// `POST` a JSON body
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, Some(body), RequestOptions::default())
            .await
    }

    /// `PUT` a JSON body
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PUT, path, Some(body), RequestOptions::default())
            .await
    }

    /// `PATCH` a JSON body
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PATCH, path, Some(body), RequestOptions::default())
            .await
    }

    /// `DELETE` a resource, ignoring any response body
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self
            .execute(Method::DELETE, path, None, &RequestOptions::default())
            .await?;
        // drained, not parsed
        response.bytes().await?;
        Ok(())
    }

    /// Send a request, renewing the session at most once on `401`
    pub async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        // Serialized once so the retry sends identical bytes
        let body = body.map(serde_json::to_vec).transpose()?;
        let response = self.execute(method, path, body.as_deref(), &options).await?;
        decode(response).await
    }

    /// Run the renewal state machine, returning the successful response
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&[u8]>,
        options: &RequestOptions,
    ) -> Result<reqwest::Response, ClientError> {
        let url = self.url(path)?;

        let mut attempt = Attempt::First;
        loop {
            let stored = self.inner.session.access_token();
            let request = self.build(
                &method,
                &url,
                body,
                options,
                &attempt,
                stored.as_deref(),
            );

            debug!(
                %method,
                path,
                retry = matches!(attempt, Attempt::Retry { .. }),
                "Sending request"
            );
            let response = request.send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            let text = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());

            if status == StatusCode::UNAUTHORIZED && attempt == Attempt::First {
                debug!(%method, path, "Request unauthorized, renewing session");
                let access = self.renew(stored.as_deref()).await?;
                attempt = Attempt::Retry { access };
                continue;
            }

            debug!(%method, path, status = status.as_u16(), "Request failed");
            return Err(ClientError::from_status(status, text));
        }
    }

    fn url(&self, path: &str) -> Result<String, ClientError> {
        let trimmed = path.trim().trim_start_matches('/');
        if trimmed.is_empty() {
            return Err(ClientError::InvalidPath(path.to_string()));
        }
        Ok(format!("{}/{}", self.inner.base_url, trimmed))
    }

    fn build(
        &self,
        method: &Method,
        url: &str,
        body: Option<&[u8]>,
        options: &RequestOptions,
        attempt: &Attempt,
        stored: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let mut request = self.inner.http.request(method.clone(), url);

        match attempt {
            Attempt::First => {
                let now = chrono::Utc::now();
                if let Some(access) = stored.filter(|a| !token::access_expired(a, now)) {
                    request = request.bearer_auth(access);
                }
                request = request.headers(options.headers.clone());
            }
            Attempt::Retry { access } => {
                let mut headers = options.headers.clone();
                headers.remove(header::AUTHORIZATION);
                request = request.headers(headers).bearer_auth(access);
            }
        }

        if let Some(body) = body {
            request = request.body(body.to_vec());
        }

        request
    }

    /// Obtain a fresh access credential or log the session out
    async fn renew(&self, rejected: Option<&str>) -> Result<String, ClientError> {
        let _guard = match self.inner.renewal {
            RenewalMode::Coalesced => Some(self.inner.renewal_lock.lock().await),
            RenewalMode::PerRequest => None,
        };

        if self.inner.renewal == RenewalMode::Coalesced {
            if let Some(current) = self.inner.session.access_token() {
                if Some(current.as_str()) != rejected
                    && !token::access_expired(&current, chrono::Utc::now())
                {
                    debug!("Session already renewed by a concurrent request");
                    return Ok(current);
                }
            }
        }

        let Some(refresh) = self.inner.session.refresh_token() else {
            warn!("No refresh credential available");
            return Err(self.expire_session());
        };

        let access = match self.exchange(&refresh).await {
            Ok(access) => access,
            Err(e) => {
                warn!(error = %e, "Session renewal failed");
                return Err(self.expire_session());
            }
        };

        match self.inner.session.update_access(access.clone()) {
            Ok(()) => {}
            Err(ClientError::SessionExpired) => return Err(self.expire_session()),
            Err(e) => return Err(e),
        }

        info!("Access credential renewed");
        Ok(access)
    }

    /// Exchange the refresh credential on the raw transport
    async fn exchange(&self, refresh: &str) -> Result<String, ClientError> {
        let body: RefreshResponse = self
            .send_public(Method::POST, REFRESH_PATH, &RefreshRequest { refresh })
            .await?;
        Ok(body.access)
    }

    /// Send a request without credentials and without renewal
    pub(crate) async fn send_public<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        debug!(%method, path, "Sending unauthenticated request");
        let response = self
            .inner
            .http
            .request(method, url)
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            decode(response).await
        } else {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            Err(ClientError::from_status(status, text))
        }
    }

    /// Wipe the session and move to the login path
    fn expire_session(&self) -> ClientError {
        warn!(redirect = %self.inner.login_path, "Session expired");
        self.end_session();
        ClientError::SessionExpired
    }

    pub(crate) fn end_session(&self) {
        if let Err(e) = self.inner.session.clear() {
            warn!(error = %e, "Failed to clear session store");
        }
        self.inner.navigator.navigate(&self.inner.login_path);
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    session: Option<Arc<dyn SessionStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    login_path: Option<String>,
    renewal: RenewalMode,
}

impl ApiClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the session store
    pub fn session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the logout navigator
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = Some(path.into());
        self
    }

    pub fn renewal(mut self, mode: RenewalMode) -> Self {
        self.renewal = mode;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base_url must not be empty".into()));
        }
        if let Err(e) = reqwest::Url::parse(&base_url) {
            return Err(ClientError::Configuration(format!(
                "invalid base_url {base_url:?}: {e}"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let mut client_builder = ClientBuilder::new().default_headers(headers);

        #[cfg(not(target_arch = "wasm32"))]
        {
            client_builder = client_builder.timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT));
        }

        #[cfg(target_arch = "wasm32")]
        let _ = self.timeout; // Timeouts not supported on WASM

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| concat!("taskmate-client/", env!("CARGO_PKG_VERSION")).to_string());
        client_builder = client_builder.user_agent(user_agent);

        let http = client_builder
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(ApiClient {
            inner: Arc::new(Inner {
                http,
                base_url,
                session: self
                    .session
                    .unwrap_or_else(|| Arc::new(MemorySessionStore::new())),
                navigator: self.navigator.unwrap_or_else(|| Arc::new(NoopNavigator)),
                login_path: self
                    .login_path
                    .unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_string()),
                renewal: self.renewal,
                renewal_lock: Mutex::new(()),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_with_single_slash() {
        let client = ApiClient::new("https://api.example.com/api/").unwrap();
        assert_eq!(client.base_url(), "https://api.example.com/api");
        assert_eq!(client.url("tasks/").unwrap(), "https://api.example.com/api/tasks/");
        assert_eq!(client.url("/tasks/1/").unwrap(), "https://api.example.com/api/tasks/1/");
    }

    #[test]
    fn empty_paths_are_rejected() {
        let client = ApiClient::new("https://api.example.com/api").unwrap();
        assert!(matches!(client.url(""), Err(ClientError::InvalidPath(_))));
        assert!(matches!(client.url(" / "), Err(ClientError::InvalidPath(_))));
    }

    #[test]
    fn builder_rejects_blank_base_url() {
        let result = ApiClient::builder().base_url("  /").build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn builder_rejects_relative_base_url() {
        for base in ["not a url", "api/v1"] {
            let result = ApiClient::new(base);
            assert!(
                matches!(result, Err(ClientError::Configuration(_))),
                "{base} should be rejected"
            );
        }
    }

    #[test]
    fn closures_are_navigators() {
        let seen = std::sync::Mutex::new(Vec::new());
        let navigator = |path: &str| seen.lock().unwrap().push(path.to_string());
        navigator.navigate("/login");
        assert_eq!(*seen.lock().unwrap(), vec!["/login".to_string()]);
    }
}
