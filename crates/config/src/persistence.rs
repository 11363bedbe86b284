//! Config file discovery, reading, and writing.
//!
//! Files are read with `serde_json5`, so both JSON5 (comments, trailing
//! commas, unquoted keys) and plain JSON work. Files are always written as
//! pretty-printed JSON, which every JSON5 reader accepts.
//!
//! # File Locations
//!
//! Candidates, first match wins:
//!
//! 1. `./join.json5`, then `./join.json`
//! 2. `~/.config/join/config.json5`, then `~/.config/join/config.json`

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// File names looked up in the working directory.
const LOCAL_FILE_NAMES: [&str; 2] = ["join.json5", "join.json"];

/// Name of the application directory below the user config directory.
const USER_CONFIG_DIR: &str = "join";

/// File names looked up in the user config directory.
const USER_FILE_NAMES: [&str; 2] = ["config.json5", "config.json"];

/// Lists every place a config file may live, in lookup order.
///
/// `user_config_root` is the platform config directory (for example
/// `~/.config`); when it is `None` only the local candidates are listed.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use join_config::persistence::config_candidates;
///
/// let candidates = config_candidates(Path::new("."), Some(Path::new("/home/u/.config")));
/// assert_eq!(candidates.len(), 4);
/// assert!(candidates[0].ends_with("join.json5"));
/// assert!(candidates[3].ends_with("join/config.json"));
/// ```
#[must_use]
pub fn config_candidates(local_dir: &Path, user_config_root: Option<&Path>) -> Vec<PathBuf> {
    let local = LOCAL_FILE_NAMES.iter().map(|name| local_dir.join(name));
    let user = user_config_root
        .map(|root| root.join(USER_CONFIG_DIR))
        .into_iter()
        .flat_map(|dir| USER_FILE_NAMES.iter().map(move |name| dir.join(name)));
    local.chain(user).collect()
}

/// Finds the first existing config file, searching the working directory
/// and then the user config directory.
///
/// # Examples
///
/// ```no_run
/// use join_config::persistence::find_config_file;
///
/// if let Some(path) = find_config_file() {
///     println!("Found config at: {}", path.display());
/// }
/// ```
#[must_use]
pub fn find_config_file() -> Option<PathBuf> {
    let user_root = dirs::config_dir();
    config_candidates(Path::new("."), user_root.as_deref())
        .into_iter()
        .find(|path| path.is_file())
}

/// Returns the user configuration directory, typically `~/.config/join/`.
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`] if the platform has no config
/// directory.
pub fn user_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join(USER_CONFIG_DIR))
        .ok_or(ConfigError::NoConfigDir)
}

/// Returns the path new user configs are saved to.
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`] if the platform has no config
/// directory.
pub fn default_user_config_path() -> Result<PathBuf> {
    Ok(user_config_dir()?.join(USER_FILE_NAMES[0]))
}

/// Reads and parses a JSON5 or JSON config file.
///
/// # Errors
///
/// Returns [`ConfigError::Unreadable`] if the file cannot be read and
/// [`ConfigError::Malformed`] if its content does not parse into `T`.
pub fn read_config_file<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json5::from_str(&content).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `config` as pretty JSON, creating missing parent directories.
///
/// # Errors
///
/// Returns [`ConfigError::Unwritable`] on I/O failure and
/// [`ConfigError::Encode`] if `config` cannot be serialized.
pub fn write_config_file<T: serde::Serialize>(path: impl AsRef<Path>, config: &T) -> Result<()> {
    let path = path.as_ref();
    let write_err = |source| ConfigError::Unwritable {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(write_err)
}
