//! Core configuration struct and loading logic.
//!
//! This module provides the main [`Config`] struct which aggregates all
//! configuration options for the join application.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::persistence::{find_config_file, read_config_file, write_config_file};
use crate::store::StoreConfig;

/// Environment variable overriding [`StoreConfig::base_url`].
pub const ENV_BASE_URL: &str = "JOIN_BASE_URL";

/// Environment variable overriding [`Config::log_filter`].
pub const ENV_LOG: &str = "JOIN_LOG";

/// Log filter used when none is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// The main configuration struct for the join application.
///
/// # Examples
///
/// ```
/// use join_config::{Config, StoreConfig};
///
/// let config = Config::default();
/// assert_eq!(config.log_filter(), "info");
///
/// let config = Config {
///     store: StoreConfig::new("https://join-123.firebaseio.com"),
///     log_filter: Some("join_board=debug".to_string()),
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// How to reach the remote store.
    #[serde(default)]
    pub store: StoreConfig,

    /// A `tracing` filter directive such as `"info"` or
    /// `"join_store=debug,info"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Config {
    /// Creates a default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from the default file locations and applies
    /// environment overrides.
    ///
    /// Sources, highest priority first:
    ///
    /// 1. `JOIN_BASE_URL` and `JOIN_LOG`
    /// 2. `./join.json5` or `./join.json`
    /// 3. `~/.config/join/config.json5` or `~/.config/join/config.json`
    /// 4. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or
    /// parsed, or if the resulting configuration is invalid.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use join_config::Config;
    ///
    /// # fn example() -> join_config::Result<()> {
    /// let config = Config::load()?;
    /// println!("Store at {}", config.store.base_url);
    /// # Ok(())
    /// # }
    /// ```
    pub fn load() -> Result<Self> {
        let mut config = match find_config_file() {
            Some(path) => read_config_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a specific file, without environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if its
    /// content is invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = read_config_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        write_config_file(path, self)
    }

    /// Overwrites settings from environment-style variables.
    ///
    /// `lookup` maps a variable name to its value; blank values are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use join_config::Config;
    ///
    /// let mut config = Config::default();
    /// config.apply_overrides(|key| match key {
    ///     "JOIN_BASE_URL" => Some("https://join-1.firebaseio.com".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(config.store.base_url, "https://join-1.firebaseio.com");
    /// assert_eq!(config.log_filter, None);
    /// ```
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_blank = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());

        if let Some(url) = non_blank(ENV_BASE_URL) {
            self.store.base_url = url;
        }
        if let Some(filter) = non_blank(ENV_LOG) {
            self.log_filter = Some(filter);
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the store settings are invalid.
    pub fn validate(&self) -> Result<()> {
        self.store.validate()
    }

    /// Returns the configured log filter, or [`DEFAULT_LOG_FILTER`].
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.store, StoreConfig::default());
        assert!(config.log_filter.is_none());
        assert!(config.validate().is_ok());
        assert_eq!(Config::new(), config);
    }

    #[test]
    fn deserialize_with_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn deserialize_partial_store() {
        let json = r#"{"store": {"base_url": "https://x.firebaseio.com"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.store.base_url, "https://x.firebaseio.com");
        assert_eq!(config.store.tasks_path, "tasks");
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = Config {
            log_filter: Some("warn".to_string()),
            ..Config::default()
        };
        config.apply_overrides(|key| match key {
            ENV_BASE_URL => Some("https://env.firebaseio.com".to_string()),
            ENV_LOG => Some("debug".to_string()),
            _ => None,
        });
        assert_eq!(config.store.base_url, "https://env.firebaseio.com");
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|_| Some("  ".to_string()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("join.json5");
        std::fs::write(
            &path,
            r#"
            {
                store: {
                    base_url: "https://join-42.firebaseio.com/",
                    timeout_secs: 10,
                    retries: 0,
                },
                log_filter: "join_store=debug",
            }
            "#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.store.base_url, "https://join-42.firebaseio.com/");
        assert_eq!(config.store.timeout_secs, Some(10));
        assert_eq!(config.store.retries, 0);
        assert_eq!(config.log_filter(), "join_store=debug");
    }

    #[test]
    fn load_from_rejects_invalid_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("join.json");
        std::fs::write(&path, r#"{"store": {"base_url": "localhost"}}"#).unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStore { .. }));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let original = Config {
            store: StoreConfig {
                timeout_secs: None,
                ..StoreConfig::new("https://join-1.firebaseio.com")
            },
            log_filter: Some("trace".to_string()),
        };

        original.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), original);
    }

    #[test]
    fn log_filter_not_serialized_when_none() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(!json.contains("log_filter"));
    }
}
