//! Error types for adapters.

use std::time::Duration;

use thiserror::Error;

/// Longest server-requested wait that is still retried in place.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Errors that can occur when talking to the cluster or the chat API.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The API answered with an unexpected status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for a connection or response.
    #[error("Request timed out")]
    Timeout,

    /// The addressed resource does not exist (deleted message, unknown channel).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API asked us to slow down.
    #[error("Rate limited: {message}")]
    RateLimited {
        /// Response body or reason.
        message: String,
        /// Wait requested by the server, if it gave one.
        retry_after: Option<Duration>,
    },

    /// A remote command could not be run or reported failure.
    #[error("Command failed: {0}")]
    Command(String),
}

impl AdapterError {
    /// Whether repeating the same request may succeed.
    ///
    /// Authentication failures, parse errors and missing resources are
    /// permanent; everything network-shaped is worth another attempt. A rate
    /// limit only counts when the requested wait is at most
    /// [`MAX_RETRY_AFTER`].
    pub fn is_transient(&self) -> bool {
        match self {
            AdapterError::Http(_) | AdapterError::Connection(_) | AdapterError::Timeout => true,
            AdapterError::RateLimited { retry_after, .. } => {
                !matches!(retry_after, Some(wait) if *wait > MAX_RETRY_AFTER)
            }
            AdapterError::Api { status, .. } => *status >= 500,
            AdapterError::Parse(_)
            | AdapterError::Auth(_)
            | AdapterError::NotFound(_)
            | AdapterError::Command(_) => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AdapterError::NotFound(_))
    }

    /// Server-requested wait before the next attempt.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AdapterError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

#[cfg(feature = "discord")]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else if err.is_decode() {
            AdapterError::Parse(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}
