//! Error types for the catalog API client and the product store.
//!
//! # Design
//! `ApiError` is what the client and transport produce. `NotFound` and
//! `RateLimited` get dedicated variants because they are the statuses
//! callers most often branch on; every other non-2xx response lands in
//! `Http` with the raw status and body.
//!
//! The store folds `ApiError` into the two-kind `ErrorKind` taxonomy the UI
//! sees: rate limiting, and everything else.

use thiserror::Error;

/// Errors returned by `CatalogClient` parse methods and `Transport`s.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server (or the shield in front of it) returned 429.
    #[error("rate limit exceeded")]
    RateLimited,

    /// Any other non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// HTTP status associated with the failure, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::RateLimited => Some(429),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error categories surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimited,
    Unknown,
}

impl From<&ApiError> for ErrorKind {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::RateLimited => ErrorKind::RateLimited,
            _ => ErrorKind::Unknown,
        }
    }
}

/// The error descriptor kept in `StoreState::error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl StoreError {
    pub const RATE_LIMIT_MESSAGE: &'static str = "Rate Limit Exceeded";

    /// Normalize an `ApiError`. Rate limiting always carries the fixed
    /// message; everything else gets `fallback`.
    pub fn from_api(err: &ApiError, fallback: &str) -> Self {
        match ErrorKind::from(err) {
            ErrorKind::RateLimited => Self {
                kind: ErrorKind::RateLimited,
                status: err.status(),
                message: Self::RATE_LIMIT_MESSAGE.to_string(),
            },
            ErrorKind::Unknown => Self::unknown(err, fallback),
        }
    }

    /// Catch-all error regardless of status. The status is still recorded.
    pub fn unknown(err: &ApiError, message: &str) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            status: err.status(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
