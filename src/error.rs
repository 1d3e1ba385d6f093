//! Error handling for estate

use std::fmt;
use thiserror::Error;

/// Main error type for estate operations
#[derive(Error, Debug)]
pub enum EstateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Session expired: {0}")]
    RefreshFailed(RefreshFailure),

    #[error("State is still being initialized")]
    NotReady,

    #[error("Another update is already in progress")]
    Busy,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl EstateError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            EstateError::Api { status, .. } => Some(*status),
            EstateError::RefreshFailed(failure) => failure.status,
            EstateError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the session can no longer authenticate and the user has to sign in again
    pub fn is_session_expired(&self) -> bool {
        matches!(self, EstateError::RefreshFailed(_))
    }
}

/// Outcome of a failed token refresh.
///
/// Cloned once per queued request so every caller that waited on the same
/// refresh observes the same status and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl RefreshFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Failure delivered to waiters when the refreshing task was dropped mid-flight
    pub fn cancelled() -> Self {
        Self::new(None, "token refresh was cancelled")
    }

    pub(crate) fn from_error(err: &EstateError) -> Self {
        match err {
            EstateError::RefreshFailed(failure) => failure.clone(),
            other => Self::new(other.status(), other.to_string()),
        }
    }
}

impl fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "refresh returned {}: {}", status, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Result type alias for estate operations
pub type Result<T> = std::result::Result<T, EstateError>;
