use thiserror::Error;

use crate::auth::StorageError;

/// Coarse classification of an `ApiError`, for callers deciding UI behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthenticated,
    Unauthorized,
    Forbidden,
    NotFound,
    ServerError,
    ClientError,
    Timeout,
    NetworkError,
    Other,
}

#[derive(Error, Debug)]
pub enum ApiError {
    /// No usable local token; the request was never sent
    #[error("{0}")]
    Unauthenticated(String),

    /// The server rejected the token (401)
    #[error("{0}")]
    Unauthorized(String),

    #[error("Access forbidden - insufficient permissions")]
    Forbidden,

    #[error("Resource not found")]
    NotFound,

    #[error("{message}")]
    ServerError { status: u16, message: String },

    #[error("{message}")]
    ClientError { status: u16, message: String },

    #[error("Request timeout - please try again")]
    Timeout,

    #[error("Network error - please check your connection and try again")]
    Network { detail: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    Encode(String),

    #[error("Token storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::Encode(error.to_string())
    }
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            ApiError::Unauthorized(_) => ErrorKind::Unauthorized,
            ApiError::Forbidden => ErrorKind::Forbidden,
            ApiError::NotFound => ErrorKind::NotFound,
            ApiError::ServerError { .. } => ErrorKind::ServerError,
            ApiError::ClientError { .. } => ErrorKind::ClientError,
            ApiError::Timeout => ErrorKind::Timeout,
            ApiError::Network { .. } => ErrorKind::NetworkError,
            ApiError::Transport(_)
            | ApiError::Decode(_)
            | ApiError::Encode(_)
            | ApiError::Storage(_) => ErrorKind::Other,
        }
    }

    /// True when the session is gone, locally or server-side.
    /// Loaders use this to decide whether to send the user back to login.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::Unauthenticated | ErrorKind::Unauthorized)
    }

    /// HTTP status behind the error, when there was a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Forbidden => Some(403),
            ApiError::NotFound => Some(404),
            ApiError::ServerError { status, .. } | ApiError::ClientError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Truncate a response body to avoid carrying excessive data in messages
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }
}
