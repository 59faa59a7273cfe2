//! Core library for the ParkFlow driver client.
//!
//! - `auth`: token storage, validation and the secret-storage backends
//! - `api`: the gated HTTP client and the typed gateway operations
//! - `loader`: concurrent, fault-tolerant page loads
//! - `config`: persisted settings and environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod loader;
pub mod models;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiClient, ApiError, ErrorKind, Navigator, RequestContext, ResponseBody};
pub use auth::{TokenStatus, TokenStore};
pub use config::{Config, TokenBackend};
pub use loader::{load_dashboard, settle_all, DashboardLoad};
