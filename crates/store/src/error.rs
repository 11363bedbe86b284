//! Error types for remote store operations.
//!
//! Every error carries the URL (or, for the in-memory store, the path) of
//! the failed request so that log lines identify the record involved.

use std::time::Duration;

/// Errors that can occur while talking to the remote store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request never produced a response.
    #[error("request to {url} failed: {source}")]
    Transport {
        /// The requested URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request did not complete in time.
    #[error("request to {url} timed out after {} seconds", after.as_secs())]
    Timeout {
        /// The requested URL.
        url: String,
        /// The configured timeout.
        after: Duration,
    },

    /// The store answered with a non-success status.
    #[error("request to {url} failed with {status} {status_text}")]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The reason phrase for the status.
        status_text: String,
    },

    /// The response body was not valid JSON.
    #[error("invalid JSON from {url}: {source}")]
    Decode {
        /// The requested URL.
        url: String,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Returns `true` if repeating the same request may succeed: transport
    /// failures, timeouts, and 5xx answers.
    ///
    /// # Examples
    ///
    /// ```
    /// use join_store::StoreError;
    ///
    /// let busy = StoreError::Status { url: "u".into(), status: 503, status_text: "Service Unavailable".into() };
    /// assert!(busy.is_retryable());
    ///
    /// let missing = StoreError::Status { url: "u".into(), status: 404, status_text: "Not Found".into() };
    /// assert!(!missing.is_retryable());
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Client(_) | Self::Decode { .. } => false,
        }
    }

    /// Returns the HTTP status code, if the store answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A specialized Result type for remote store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
