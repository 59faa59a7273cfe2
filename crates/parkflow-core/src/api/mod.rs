//! REST client for the ParkFlow gateway.
//!
//! `ApiClient` wraps every call in the same pipeline: token gate, timeout,
//! status classification. Typed operations for each gateway endpoint live in
//! `endpoints` as further `impl ApiClient` blocks.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod transport;

pub use client::{
    ApiClient, Navigator, RequestContext, ResponseBody, DEFAULT_BASE_URL, REQUEST_TIMEOUT_SECS,
};
pub use error::{ApiError, ErrorKind};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
