//! The store abstraction shared by the HTTP and in-memory clients.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// HTTP verb of a store request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read a value.
    Get,
    /// Append a child under a generated key.
    Post,
    /// Replace a value.
    Put,
    /// Merge top-level fields into a value.
    Patch,
    /// Remove a value.
    Delete,
}

impl Method {
    /// Returns the verb as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Returns `true` if sending the request twice has the same effect as
    /// sending it once. Only POST is not, since it creates a new key each
    /// time.
    #[must_use]
    pub const fn is_idempotent(self) -> bool {
        !matches!(self, Self::Post)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Patch => Self::PATCH,
            Method::Delete => Self::DELETE,
        }
    }
}

/// A JSON document store addressed by slash-separated paths.
///
/// Implementations only provide [`send`](Self::send); the verb helpers are
/// shorthands for it. Successful responses are parsed JSON, with `null`
/// standing for "nothing there".
#[async_trait]
pub trait RemoteStore: Send + Sync + fmt::Debug {
    /// Sends one request and returns the parsed response body.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`](crate::StoreError) on transport failure,
    /// non-success status, or an unparsable body.
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value>;

    /// Reads the value at `path`.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    async fn get(&self, path: &str) -> Result<Value> {
        self.send(Method::Get, path, None).await
    }

    /// Adds `body` under a generated key below `path` and returns
    /// `{"name": key}`.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(Method::Post, path, Some(body)).await
    }

    /// Replaces the value at `path` with `body`.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(Method::Put, path, Some(body)).await
    }

    /// Overwrites the top-level fields of `body` at `path`, leaving other
    /// fields untouched.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    async fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(Method::Patch, path, Some(body)).await
    }

    /// Removes the value at `path`.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    async fn delete(&self, path: &str) -> Result<Value> {
        self.send(Method::Delete, path, None).await
    }
}

/// Joins path segments with `/`, ignoring stray slashes.
///
/// # Examples
///
/// ```
/// use join_store::join_path;
///
/// assert_eq!(join_path(&["tasks", "-Nabc"]), "tasks/-Nabc");
/// assert_eq!(join_path(&["/tasks/", "/-Nabc"]), "tasks/-Nabc");
/// ```
#[must_use]
pub fn join_path(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
