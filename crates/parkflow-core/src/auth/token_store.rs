//! Bearer token storage and local validity checks.
//!
//! The token is a three-segment JWT-style string. Only the payload is
//! inspected, for its `exp` claim; the signature is the server's business.
//! Validation is total: any input, however malformed, yields a `TokenStatus`
//! and never an error or panic.

use std::fmt;
use std::sync::Arc;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::storage::{MemoryStorage, SecretStorage, StorageError};

/// Storage slot holding the bearer token
pub const TOKEN_SLOT: &str = "authToken";

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

/// Tokens are issued base64url, but older issuers used the standard alphabet.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Why a stored string is not a usable token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// Not exactly three dot-separated segments
    SegmentCount(usize),
    EmptySegment,
    PayloadEncoding,
    PayloadJson,
    PayloadNotObject,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::SegmentCount(n) => write!(f, "expected 3 segments, got {}", n),
            MalformedReason::EmptySegment => write!(f, "empty segment"),
            MalformedReason::PayloadEncoding => write!(f, "payload is not base64"),
            MalformedReason::PayloadJson => write!(f, "payload is not JSON"),
            MalformedReason::PayloadNotObject => write!(f, "payload is not a JSON object"),
        }
    }
}

/// Result of inspecting the stored token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenStatus {
    Missing,
    Malformed(MalformedReason),
    /// Payload has no usable `exp` claim
    MissingExpiry,
    Expired { expired_at_ms: i64 },
    Valid { expires_at_ms: i64 },
}

impl TokenStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenStatus::Valid { .. })
    }

    /// Expiry instant, when the payload carried one
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        match self {
            TokenStatus::Expired { expired_at_ms: ms } | TokenStatus::Valid { expires_at_ms: ms } => {
                DateTime::from_timestamp_millis(*ms)
            }
            _ => None,
        }
    }
}

/// Decode the payload segment of a token into a JSON object.
pub fn decode_payload(token: &str) -> Result<Map<String, Value>, MalformedReason> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(MalformedReason::SegmentCount(segments.len()));
    }
    if segments.iter().any(|s| s.is_empty()) {
        return Err(MalformedReason::EmptySegment);
    }

    let bytes = URL_SAFE_LENIENT
        .decode(segments[1])
        .or_else(|_| STANDARD_LENIENT.decode(segments[1]))
        .map_err(|_| MalformedReason::PayloadEncoding)?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(MalformedReason::PayloadNotObject),
        Err(_) => Err(MalformedReason::PayloadJson),
    }
}

/// Classify a token string against the current time.
pub fn inspect(token: Option<&str>, now_ms: i64) -> TokenStatus {
    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => return TokenStatus::Missing,
    };

    let payload = match decode_payload(token) {
        Ok(payload) => payload,
        Err(reason) => return TokenStatus::Malformed(reason),
    };

    // `exp` must be a non-zero number; absent, null, 0 and non-numbers all fail
    let exp = match payload.get("exp").and_then(Value::as_f64) {
        Some(exp) if exp != 0.0 && exp.is_finite() => exp,
        _ => return TokenStatus::MissingExpiry,
    };

    let exp_ms = exp * 1000.0;
    // `as` saturates, which is fine for display purposes
    let exp_ms_display = exp_ms as i64;
    if exp_ms > now_ms as f64 {
        TokenStatus::Valid { expires_at_ms: exp_ms_display }
    } else {
        TokenStatus::Expired { expired_at_ms: exp_ms_display }
    }
}

/// Single source of truth for the bearer token.
/// Clone is cheap - storage and clock are shared.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn SecretStorage>,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn SecretStorage>) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
        }
    }

    /// A store that forgets the token when the process exits
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The stored token, if any. Storage failures read as "no token".
    pub fn get(&self) -> Option<String> {
        match self.storage.read(TOKEN_SLOT) {
            Ok(Some(token)) if !token.is_empty() => Some(token),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read auth token, treating as absent");
                None
            }
        }
    }

    /// Store a token. `None` or an empty string clears the slot instead.
    pub fn set(&self, token: Option<&str>) -> Result<(), StorageError> {
        match token {
            Some(token) if !token.is_empty() => self.storage.write(TOKEN_SLOT, token),
            _ => self.clear(),
        }
    }

    /// Remove the token. This cannot touch a server-set session cookie;
    /// that takes a call to the logout endpoint.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(TOKEN_SLOT)
    }

    /// Inspect the stored token without side effects.
    pub fn status(&self) -> TokenStatus {
        let token = self.get();
        let status = inspect(token.as_deref(), self.clock.now_millis());
        match &status {
            TokenStatus::Missing => debug!("No auth token stored"),
            TokenStatus::Malformed(reason) => debug!(%reason, "Auth token is malformed"),
            TokenStatus::MissingExpiry => debug!("Auth token has no expiration claim"),
            TokenStatus::Expired { expired_at_ms } => {
                debug!(expired_at_ms, "Auth token expired")
            }
            TokenStatus::Valid { expires_at_ms } => debug!(expires_at_ms, "Auth token is valid"),
        }
        status
    }

    pub fn is_valid(&self) -> bool {
        self.status().is_valid()
    }

    /// Decoded payload of the stored token, for display
    pub fn claims(&self) -> Option<Map<String, Value>> {
        self.get().and_then(|token| decode_payload(&token).ok())
    }
}

// Never prints the token itself.
impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_token", &self.get().is_some())
            .finish_non_exhaustive()
    }
}
