//! Authentication state for the ParkFlow client.
//!
//! This module provides:
//! - `TokenStore`: the single source of truth for the bearer token, with
//!   local expiry validation
//! - `SecretStorage` backends: OS keychain, encrypted file, in-memory
//! - `Clock`: wall-clock time, swappable in tests
//!
//! Tokens are never verified cryptographically here. The server stays the
//! authority; local validation only avoids sending requests that would fail.

pub mod clock;
pub mod credentials;
pub mod encrypted;
pub mod storage;
pub mod token_store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use credentials::KeyringStorage;
pub use encrypted::EncryptedFileStorage;
pub use storage::{MemoryStorage, SecretStorage, StorageError};
pub use token_store::{decode_payload, inspect, MalformedReason, TokenStatus, TokenStore, TOKEN_SLOT};
