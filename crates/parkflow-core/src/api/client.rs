//! API client for the ParkFlow gateway.
//!
//! Every call goes through [`ApiClient::send`], which gates authenticated
//! requests on a locally valid token, enforces the request timeout, and
//! turns HTTP statuses into [`ApiError`]s. A call makes exactly one attempt;
//! retry policy belongs to the caller.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
use super::ApiError;
use crate::auth::TokenStore;

// ============================================================================
// Constants
// ============================================================================

/// Gateway origin used when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8090";

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Best-effort server-side session cleanup
pub(crate) const LOGOUT_PATH: &str = "/api/auth/logout";

/// Where the user is sent when the session is gone.
pub trait Navigator: Send + Sync {
    fn to_login(&self);
}

impl<F> Navigator for F
where
    F: Fn() + Send + Sync,
{
    fn to_login(&self) {
        self()
    }
}

/// Navigator for headless use: only logs.
struct LogNavigator;

impl Navigator for LogNavigator {
    fn to_login(&self) {
        info!("Login required");
    }
}

/// One request, built per call and dropped after the response is handled.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub requires_auth: bool,
    pub auto_redirect: bool,
}

impl RequestContext {
    /// An authenticated request without auto-redirect
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            requires_auth: true,
            auto_redirect: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` as the JSON request body
    pub fn with_json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, ApiError> {
        Ok(self.with_body(serde_json::to_value(body)?))
    }

    /// Skip the token gate and send no bearer token
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    pub fn requires_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }

    /// Send the user to login if the server answers 401
    pub fn auto_redirect(mut self) -> Self {
        self.auto_redirect = true;
        self
    }
}

/// A successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// The response declared a JSON content type
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Deserialize into `T`. Text bodies are parsed as JSON too.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            ResponseBody::Json(value) => {
                serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
            }
            ResponseBody::Text(text) => {
                serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
            }
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            ResponseBody::Json(value) => value,
            ResponseBody::Text(text) => Value::String(text),
        }
    }
}

/// API client for the ParkFlow gateway.
/// Clone is cheap - transport, token store and navigator are shared.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    tokens: TokenStore,
    navigator: Arc<dyn Navigator>,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client talking HTTP to `base_url`. `timeout` bounds both the
    /// request race and the underlying HTTP client.
    pub fn new(base_url: &str, tokens: TokenStore, timeout: Duration) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(timeout).map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self::with_transport(base_url, Arc::new(transport), tokens).with_timeout(timeout))
    }

    pub fn with_transport(base_url: &str, transport: Arc<dyn Transport>, tokens: TokenStore) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            tokens,
            navigator: Arc::new(LogNavigator),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ===== Convenience verbs =====

    pub async fn get(&self, path: &str, requires_auth: bool) -> Result<ResponseBody, ApiError> {
        self.send(RequestContext::get(path).requires_auth(requires_auth)).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: Option<Value>,
        requires_auth: bool,
    ) -> Result<ResponseBody, ApiError> {
        self.send(Self::with_optional_body(RequestContext::post(path), body).requires_auth(requires_auth))
            .await
    }

    pub async fn put(
        &self,
        path: &str,
        body: Option<Value>,
        requires_auth: bool,
    ) -> Result<ResponseBody, ApiError> {
        self.send(Self::with_optional_body(RequestContext::put(path), body).requires_auth(requires_auth))
            .await
    }

    pub async fn delete(&self, path: &str, requires_auth: bool) -> Result<ResponseBody, ApiError> {
        self.send(RequestContext::delete(path).requires_auth(requires_auth)).await
    }

    fn with_optional_body(ctx: RequestContext, body: Option<Value>) -> RequestContext {
        match body {
            Some(body) => ctx.with_body(body),
            None => ctx,
        }
    }

    // ===== Request pipeline =====

    /// Perform one request: token gate, dispatch with timeout, classification.
    pub async fn send(&self, ctx: RequestContext) -> Result<ResponseBody, ApiError> {
        let bearer = if ctx.requires_auth {
            Some(self.bearer_or_redirect()?)
        } else {
            None
        };

        let body = match ctx.body {
            Some(ref body) => Some(serde_json::to_string(body)?),
            None => None,
        };

        let request = HttpRequest {
            method: ctx.method.clone(),
            url: format!("{}{}", self.base_url, ctx.path),
            bearer,
            body,
        };

        debug!(method = %ctx.method, path = %ctx.path, auth = ctx.requires_auth, "Sending request");
        let response = self.dispatch(request).await?;
        self.classify(&ctx, response)
    }

    /// Token for the `Authorization` header. A missing or unusable token sends
    /// the user to login and fails without touching the network.
    fn bearer_or_redirect(&self) -> Result<String, ApiError> {
        if !self.tokens.is_valid() {
            self.redirect_to_login();
            return Err(ApiError::Unauthenticated(
                "Invalid or expired authentication token".to_string(),
            ));
        }

        match self.tokens.get() {
            Some(token) => Ok(token),
            None => {
                // Cleared between the check and the read
                self.redirect_to_login();
                Err(ApiError::Unauthenticated("No authentication token".to_string()))
            }
        }
    }

    /// Race the transport against the timeout. Losing the race drops the
    /// in-flight request, which closes its connection.
    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(TransportError::Aborted)) => Err(ApiError::Timeout),
            Ok(Err(TransportError::Network(detail))) => {
                debug!(%detail, "Network failure");
                Err(ApiError::Network { detail })
            }
            Ok(Err(TransportError::Other(message))) => Err(ApiError::Transport(message)),
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Request timed out, aborted");
                Err(ApiError::Timeout)
            }
        }
    }

    fn classify(&self, ctx: &RequestContext, response: HttpResponse) -> Result<ResponseBody, ApiError> {
        match response.status {
            401 => Err(self.handle_unauthorized(ctx)),
            403 => Err(ApiError::Forbidden),
            404 => Err(ApiError::NotFound),
            status if status >= 500 => Err(ApiError::ServerError {
                status,
                message: server_error_message(&response),
            }),
            200..=299 => decode_success(&response),
            status => Err(ApiError::ClientError {
                status,
                message: client_error_message(&response),
            }),
        }
    }

    /// A 401 always drops the local token, even one that still looks valid:
    /// the server no longer honors the session.
    fn handle_unauthorized(&self, ctx: &RequestContext) -> ApiError {
        let looked_valid = self.tokens.is_valid();
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "Failed to clear auth token after 401");
        }
        if ctx.auto_redirect {
            self.redirect_to_login();
        }

        if looked_valid {
            warn!(path = %ctx.path, "Received 401 but token appears valid");
            ApiError::Unauthorized("Unauthorized - please login again".to_string())
        } else {
            ApiError::Unauthorized("Unauthorized - token expired or invalid".to_string())
        }
    }

    // ===== Recovery =====

    /// Drop the session and send the user to login.
    ///
    /// Clears the token, tells the backend to drop its session cookie
    /// (fire-and-forget), then navigates. Safe to call when logged out.
    pub fn redirect_to_login(&self) {
        self.clear_and_notify_logout();
        self.navigator.to_login();
    }

    /// Clear the token and spawn the logout notification. Returns the task
    /// handle, or `None` outside a tokio runtime.
    pub(crate) fn clear_and_notify_logout(&self) -> Option<JoinHandle<()>> {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "Failed to clear auth token");
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                debug!("No async runtime, skipping logout notification");
                return None;
            }
        };
        let client = self.clone();
        Some(runtime.spawn(async move {
            client.notify_logout().await;
        }))
    }

    /// Ask the backend to end its session. Uses the cookie jar, not a bearer
    /// token; failures are only logged.
    pub(crate) async fn notify_logout(&self) {
        let request = HttpRequest {
            method: Method::POST,
            url: format!("{}{}", self.base_url, LOGOUT_PATH),
            bearer: None,
            body: None,
        };
        match self.dispatch(request).await {
            Ok(response) => debug!(status = response.status, "Logout notification sent"),
            Err(e) => debug!(error = %e, "Logout notification failed"),
        }
    }
}

// ============================================================================
// Response decoding
// ============================================================================

fn decode_success(response: &HttpResponse) -> Result<ResponseBody, ApiError> {
    if response.body.is_empty() {
        return Ok(ResponseBody::Text(String::new()));
    }
    if response.is_json() {
        serde_json::from_slice(&response.body)
            .map(ResponseBody::Json)
            .map_err(|e| ApiError::Decode(e.to_string()))
    } else {
        Ok(ResponseBody::Text(response.text()))
    }
}

/// First non-empty string among `fields` of a JSON object
fn string_field(value: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|f| value.get(*f).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Best-effort human-readable message from an error body.
///
/// `Ok(Some)` is a message from a JSON field, `Ok(None)` a declared-JSON body
/// without one, and `Err` the (possibly empty) body read as text instead.
fn extract_message(response: &HttpResponse, fields: &[&str]) -> Result<Option<String>, String> {
    match serde_json::from_slice::<Value>(&response.body) {
        Ok(value) => {
            if let Some(message) = string_field(&value, fields) {
                return Ok(Some(message));
            }
            if response.is_json() {
                return Ok(None);
            }
        }
        Err(e) if response.is_json() => {
            debug!(error = %e, "Error body declared JSON but did not parse, reading as text");
        }
        Err(_) => {}
    }

    let text = response.text().trim().to_string();
    debug!(status = response.status, body = %ApiError::truncate_body(&text), "Error body read as text");
    Err(text)
}

fn server_error_message(response: &HttpResponse) -> String {
    let fallback = format!("Server error: {}", response.status);
    match extract_message(response, &["error"]) {
        Ok(Some(message)) => message,
        Ok(None) => fallback,
        Err(text) if !text.is_empty() => text,
        Err(_) => fallback,
    }
}

fn client_error_message(response: &HttpResponse) -> String {
    let fallback = format!("HTTP {}: Request failed", response.status);
    match extract_message(response, &["error", "message"]) {
        Ok(Some(message)) => message,
        Ok(None) => fallback,
        Err(text) if !text.is_empty() => format!("HTTP {}: {}", response.status, text),
        Err(_) => fallback,
    }
}
