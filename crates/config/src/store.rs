//! Remote store connection settings.
//!
//! The store is a Firebase Realtime Database (or its local emulator). Every
//! request goes to `{base_url}/{path}.json`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Base URL used when none is configured: the local database emulator.
pub const DEFAULT_BASE_URL: &str = "http://localhost:9000";

/// Collection path the tasks live under.
pub const DEFAULT_TASKS_PATH: &str = "tasks";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Shortest accepted timeout in seconds.
pub const MIN_TIMEOUT_SECS: u64 = 1;

/// Longest accepted timeout in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Default number of retries for idempotent requests.
pub const DEFAULT_RETRIES: u8 = 1;

/// Most retries accepted.
pub const MAX_RETRIES: u8 = 3;

/// How to reach the remote store.
///
/// `timeout_secs: null` disables the timeout and `retries: 0` disables
/// retries.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use join_config::StoreConfig;
///
/// let config = StoreConfig::default();
/// assert_eq!(config.base_url, "http://localhost:9000");
/// assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
///
/// let config = StoreConfig::new("https://join-123.firebaseio.com/");
/// assert_eq!(config.tasks_path, "tasks");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database root URL, with or without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the task collection below the root.
    #[serde(default = "default_tasks_path")]
    pub tasks_path: String,

    /// Per-request timeout in seconds; `None` waits forever.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: Option<u64>,

    /// How often a failed GET, PUT, PATCH, or DELETE is retried.
    #[serde(default = "default_retries")]
    pub retries: u8,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_tasks_path() -> String {
    DEFAULT_TASKS_PATH.to_string()
}

fn default_timeout_secs() -> Option<u64> {
    Some(DEFAULT_TIMEOUT_SECS)
}

fn default_retries() -> u8 {
    DEFAULT_RETRIES
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl StoreConfig {
    /// Creates settings for the given database URL with default
    /// timeout and retries.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            tasks_path: default_tasks_path(),
            timeout_secs: default_timeout_secs(),
            retries: DEFAULT_RETRIES,
        }
    }

    /// Returns the request timeout, if one is set.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStore`] if the base URL is not http(s),
    /// the tasks path is blank, or timeout or retries are out of range.
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        let host = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"));
        if host.is_none_or(|h| h.trim_matches('/').is_empty()) {
            return Err(invalid(format!(
                "base_url {:?} must be an http:// or https:// URL",
                self.base_url
            )));
        }

        if self.tasks_path.trim_matches('/').trim().is_empty() {
            return Err(invalid("tasks_path cannot be empty".to_string()));
        }

        if let Some(secs) = self.timeout_secs
            && !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&secs)
        {
            return Err(invalid(format!(
                "timeout {secs} must be between {MIN_TIMEOUT_SECS} and {MAX_TIMEOUT_SECS} seconds"
            )));
        }

        if self.retries > MAX_RETRIES {
            return Err(invalid(format!(
                "retries {} exceeds maximum of {MAX_RETRIES}",
                self.retries
            )));
        }

        Ok(())
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::InvalidStore { reason }
}
