//! Remote store client for join.
//!
//! Tasks live in a Firebase Realtime Database, reached through its REST
//! API: every path is addressed as `{base_url}/{path}.json` and read or
//! written with plain JSON.
//!
//! # Overview
//!
//! - [`RemoteStore`]: The store abstraction the board depends on
//! - [`HttpStore`]: `reqwest` client with timeout and retry of idempotent verbs
//! - [`MemoryStore`]: In-process store with the same write semantics, a
//!   request log, and failure injection
//! - [`StoreError`]: Error types for store operations
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//! use join_store::{HttpStore, RemoteStore};
//! use serde_json::json;
//!
//! # async fn example() -> join_store::Result<()> {
//! let store = HttpStore::new("http://localhost:9000", Some(Duration::from_secs(30)), 1)?;
//!
//! let created = store.post("tasks", &json!({ "title": "Write docs" })).await?;
//! let id = created["name"].as_str().unwrap_or_default();
//!
//! store.patch(&format!("tasks/{id}"), &json!({ "mainCategory": "Done" })).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod memory;
pub mod remote;

pub use client::HttpStore;
pub use error::{Result, StoreError};
pub use memory::{MemoryStore, Request};
pub use remote::{Method, RemoteStore, join_path};
