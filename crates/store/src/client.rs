//! HTTP client for the Firebase Realtime Database REST API.
//!
//! This module provides [`HttpStore`], which maps store paths to
//! `{base_url}/{path}.json` and sends JSON bodies with `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::{Result, StoreError};
use crate::remote::{Method, RemoteStore};

/// Remote store client speaking the Firebase REST dialect.
///
/// Requests time out after the configured duration, if any. GET, PUT,
/// PATCH, and DELETE are retried up to `retries` times on transport
/// failures, timeouts, and 5xx answers; POST is never retried.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use join_store::{HttpStore, RemoteStore};
///
/// # async fn example() -> join_store::Result<()> {
/// let store = HttpStore::new("http://localhost:9000", Some(Duration::from_secs(30)), 1)?;
/// let tasks = store.get("tasks").await?;
/// println!("{tasks}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpStore {
    http: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
    retries: u8,
}

impl HttpStore {
    /// Creates a client for the database rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Client`] if the HTTP client cannot be built.
    #[instrument(fields(timeout_secs = timeout.map(|t| t.as_secs())))]
    pub fn new(base_url: &str, timeout: Option<Duration>, retries: u8) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(StoreError::Client)?;
        debug!("created store client");

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            retries,
        })
    }

    /// Returns the URL a store path maps to.
    ///
    /// # Examples
    ///
    /// ```
    /// use join_store::HttpStore;
    ///
    /// let store = HttpStore::new("https://join.firebaseio.com/", None, 0).unwrap();
    /// assert_eq!(store.url("tasks"), "https://join.firebaseio.com/tasks.json");
    /// assert_eq!(store.url("/tasks/-Na/"), "https://join.firebaseio.com/tasks/-Na.json");
    /// ```
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    #[instrument(skip(self, body), fields(attempts = tracing::field::Empty))]
    async fn request(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value> {
        let attempts = if method.is_idempotent() {
            1 + u32::from(self.retries)
        } else {
            1
        };
        tracing::Span::current().record("attempts", attempts);

        let mut attempt = 1;
        loop {
            match self.send_once(method, url, body).await {
                Err(err) if attempt < attempts && err.is_retryable() => {
                    warn!(attempt, error = %err, "store request failed, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn send_once(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value> {
        let mut request = self.http.request(method.into(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.transport_error(url, e))?;
        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "store rejected request");
            return Err(StoreError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))?;
        debug!(status = status.as_u16(), bytes = text.len(), "store answered");
        parse_body(url, &text)
    }

    fn transport_error(&self, url: &str, source: reqwest::Error) -> StoreError {
        match self.timeout {
            Some(after) if source.is_timeout() => StoreError::Timeout {
                url: url.to_string(),
                after,
            },
            _ => StoreError::Transport {
                url: url.to_string(),
                source,
            },
        }
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        self.request(method, &self.url(path), body).await
    }
}

/// Parses a response body; an empty body is `null`.
fn parse_body(url: &str, text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|source| StoreError::Decode {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn store(server: &Server, retries: u8) -> HttpStore {
        HttpStore::new(&server.url(), Some(Duration::from_secs(5)), retries).unwrap()
    }

    #[test]
    fn parse_body_empty_is_null() {
        assert_eq!(parse_body("u", "").unwrap(), Value::Null);
        assert_eq!(parse_body("u", " \n").unwrap(), Value::Null);
        assert_eq!(parse_body("u", "null").unwrap(), Value::Null);
        assert!(matches!(parse_body("u", "<html>"), Err(StoreError::Decode { .. })));
    }

    #[tokio::test]
    async fn get_appends_json_suffix() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/tasks.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"-Na":{"title":"T","category":"User Story"}}"#)
            .create_async()
            .await;

        let value = store(&server, 0).get("tasks").await.unwrap();
        assert_eq!(value["-Na"]["title"], "T");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_collection_is_null() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/tasks.json")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        assert_eq!(store(&server, 0).get("tasks").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn patch_sends_json_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/tasks/-Na.json")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({ "mainCategory": "ToDo" })))
            .with_status(200)
            .with_body(r#"{"mainCategory":"ToDo"}"#)
            .create_async()
            .await;

        store(&server, 0)
            .patch("tasks/-Na", &json!({ "mainCategory": "ToDo" }))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn post_returns_generated_name() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/tasks.json")
            .with_status(200)
            .with_body(r#"{"name":"-Nnew"}"#)
            .create_async()
            .await;

        let value = store(&server, 1)
            .post("tasks", &json!({ "title": "New" }))
            .await
            .unwrap();
        assert_eq!(value["name"], "-Nnew");
    }

    #[tokio::test]
    async fn status_error_carries_code_and_text() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("DELETE", "/tasks/-Na.json")
            .with_status(401)
            .with_body(r#"{"error":"Permission denied"}"#)
            .create_async()
            .await;

        let err = store(&server, 1).delete("tasks/-Na").await.unwrap_err();
        match err {
            StoreError::Status {
                status,
                status_text,
                url,
            } => {
                assert_eq!(status, 401);
                assert_eq!(status_text, "Unauthorized");
                assert!(url.ends_with("/tasks/-Na.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn idempotent_requests_are_retried_on_5xx() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/tasks/-Na.json")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let err = store(&server, 2)
            .put("tasks/-Na", &json!({ "title": "T" }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn post_is_never_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/tasks.json")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let err = store(&server, 3)
            .post("tasks", &json!({ "title": "T" }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/tasks/-Nx.json")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        assert!(store(&server, 3).get("tasks/-Nx").await.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_store_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = HttpStore::new(&format!("http://{addr}"), None, 0).unwrap();
        let err = store.get("tasks").await.unwrap_err();
        assert!(matches!(err, StoreError::Transport { .. }), "{err}");
        assert!(err.is_retryable());
    }
}
