//! Errors raised while locating, reading or writing `join` settings.

use std::path::PathBuf;

/// Why the board settings could not be loaded or saved.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A `join.json5`, `join.json` or user `config.json5` exists but could
    /// not be opened.
    #[error("cannot read settings from {path}: {source}")]
    Unreadable {
        /// The settings file.
        path: PathBuf,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Saving settings failed, either creating the directory or the file.
    #[error("cannot save settings to {path}: {source}")]
    Unwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON5 or does not match the
    /// expected shape (for example a `store` that is not an object).
    #[error("{path} is not a valid settings file: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json5::Error,
    },

    /// Settings could not be turned into JSON for saving.
    #[error("cannot encode settings: {0}")]
    Encode(#[from] serde_json::Error),

    /// The `store` section cannot be used to reach the database.
    #[error("invalid store configuration: {reason}")]
    InvalidStore {
        /// Why the settings were rejected.
        reason: String,
    },

    /// The platform reports no per-user config directory, so there is no
    /// `join/config.json5` location to fall back to.
    #[error("no user config directory on this platform")]
    NoConfigDir,
}

/// Result alias for settings operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
