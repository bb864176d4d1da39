//! Error taxonomy for API access.
//!
//! Every failure a caller can observe is one of these variants. Only the
//! auth-related ones destroy the stored session; transport and server
//! errors leave it intact so the same call can simply be retried.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure: DNS, connect, TLS, timeout, broken body.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server rejected a freshly refreshed token. The session is gone.
    #[error("authorization expired")]
    AuthExpired,

    /// The refresh exchange itself failed. The session is gone.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// A 2xx response whose body did not have the promised shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Server-side trouble (5xx or 429). Worth retrying later.
    #[error("transient server error (HTTP {status})")]
    Transient { status: u16 },

    /// The request itself was rejected (4xx other than 401/429).
    #[error("request rejected (HTTP {status})")]
    Fatal { status: u16 },

    /// No access token in storage when an authenticated call was made.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A filter specification that failed boundary validation.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Session file could not be read or written.
    #[error("session storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Classify an unsuccessful HTTP status. 401 is handled by the
    /// authenticated client before this is ever consulted.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            ApiError::Transient {
                status: status.as_u16(),
            }
        } else {
            ApiError::Fatal {
                status: status.as_u16(),
            }
        }
    }

    /// Whether this condition ends the session. Callers use this to tell
    /// "log in again" apart from "try again later".
    pub fn forces_logout(&self) -> bool {
        matches!(
            self,
            ApiError::AuthExpired | ApiError::RefreshFailed(_) | ApiError::NotAuthenticated
        )
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::MalformedResponse(err.to_string())
    }
}
