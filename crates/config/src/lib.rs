//! Configuration management for the join application.
//!
//! This crate handles loading, validating, and persisting configuration
//! from files, environment variables, and defaults.
//!
//! # Overview
//!
//! - [`config`]: Core configuration struct, loading, and env overrides
//! - [`store`]: Remote store URL, timeout, and retry settings
//! - [`persistence`]: Config file discovery, reading, and writing
//! - [`error`]: Error types for configuration operations
//!
//! # Configuration Sources (Priority)
//!
//! 1. Environment variables (`JOIN_BASE_URL`, `JOIN_LOG`)
//! 2. Local config (`./join.json5` or `./join.json`)
//! 3. User config (`~/.config/join/config.json5` or `~/.config/join/config.json`)
//! 4. Built-in defaults
//!
//! # Example File
//!
//! ```json5
//! {
//!   store: {
//!     base_url: "https://join-123-default-rtdb.europe-west1.firebasedatabase.app",
//!     tasks_path: "tasks",
//!     timeout_secs: 30, // null waits forever
//!     retries: 1,       // 0 disables retries
//!   },
//!   log_filter: "info",
//! }
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use join_config::Config;
//!
//! # fn example() -> join_config::Result<()> {
//! let config = Config::load()?;
//! println!("Tasks at {}/{}", config.store.base_url, config.store.tasks_path);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod persistence;
pub mod store;

pub use config::Config;
pub use error::{ConfigError, Result};
pub use store::StoreConfig;
