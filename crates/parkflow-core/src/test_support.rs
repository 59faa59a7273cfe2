//! Shared fixtures for unit tests: token builder, fixed time, scripted transport.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::api::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::api::ApiClient;
use crate::auth::{FixedClock, TokenStore};

/// 2023-11-14T22:13:20Z, a whole second
pub const NOW_MS: i64 = 1_700_000_000_000;

pub const BASE_URL: &str = "http://parkflow.test";

/// Build a token whose payload is exactly `payload_json`
pub fn token_with_payload(payload_json: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(payload_json.as_bytes());
    format!("{}.{}.c2lnbmF0dXJl", header, payload)
}

/// Build a token expiring at `exp` (seconds since epoch)
pub fn make_token(exp: i64) -> String {
    token_with_payload(&format!(r#"{{"sub":"driver@example.com","exp":{}}}"#, exp))
}

/// A token valid for an hour past `NOW_MS`
pub fn fresh_token() -> String {
    make_token(NOW_MS / 1000 + 3600)
}

pub fn json_response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        content_type: Some("application/json".to_string()),
        body: body.as_bytes().to_vec(),
    }
}

pub fn text_response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        content_type: Some("text/plain; charset=utf-8".to_string()),
        body: body.as_bytes().to_vec(),
    }
}

type Responder = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

/// Transport that answers from a closure and records every request.
pub struct FakeTransport {
    responder: Box<Responder>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
    aborted: Arc<AtomicBool>,
}

impl FakeTransport {
    pub fn new(
        responder: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            delay: None,
            aborted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Answer every request with the same response
    pub fn always(response: HttpResponse) -> Self {
        Self::new(move |_| Ok(response.clone()))
    }

    /// Hold each request for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests whose URL ends with `path`
    pub fn calls_to(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.ends_with(path))
            .count()
    }

    /// Whether an in-flight request was dropped before it finished
    pub fn was_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

struct InFlight {
    aborted: Arc<AtomicBool>,
    finished: bool,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.finished {
            self.aborted.store(true, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        let mut in_flight = InFlight {
            aborted: Arc::clone(&self.aborted),
            finished: false,
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        in_flight.finished = true;

        (self.responder)(&request)
    }
}

/// Counts login redirects
#[derive(Clone, Default)]
pub struct RedirectCounter(Arc<AtomicUsize>);

impl RedirectCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// A client over `transport` with a token store pinned at `NOW_MS`
pub fn client_with(transport: Arc<FakeTransport>, token: Option<&str>) -> (ApiClient, RedirectCounter) {
    let tokens = TokenStore::in_memory().with_clock(Arc::new(FixedClock(NOW_MS)));
    tokens.set(token).unwrap();

    let redirects = RedirectCounter::default();
    let counter = Arc::clone(&redirects.0);
    let client = ApiClient::with_transport(BASE_URL, transport, tokens).with_navigator(Arc::new(
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    ));
    (client, redirects)
}
