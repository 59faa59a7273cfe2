//! The network edge of the API client.
//!
//! `Transport` performs exactly one HTTP round trip and hands back a fully
//! buffered response. Everything above it (auth gating, timeouts, status
//! classification) lives in `ApiClient`, so tests can script a transport
//! without a server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Bearer token for the `Authorization` header
    pub bearer: Option<String>,
    /// Serialized JSON body
    pub body: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    /// The request was cancelled before completing
    #[error("request aborted")]
    Aborted,

    /// Connection failed or the transfer was cut short
    #[error("network failure: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `Transport` over a shared reqwest client.
/// The client keeps a cookie jar, so the backend's session cookie rides along
/// on every request, authenticated or not.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn map_error(error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Aborted
        } else if error.is_connect() || error.is_request() || error.is_body() || error.is_decode() {
            TransportError::Network(error.to_string())
        } else {
            TransportError::Other(error.to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .header(header::ACCEPT, "application/json");

        if let Some(ref token) = request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body {
            builder = builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder.send().await.map_err(Self::map_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Buffer once; error extraction may need to look at the bytes twice
        let body = response.bytes().await.map_err(Self::map_error)?.to_vec();

        debug!(method = %request.method, url = %request.url, status, bytes = body.len(), "Response received");

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}
