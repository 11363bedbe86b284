//! In-process store with Firebase write semantics.
//!
//! [`MemoryStore`] holds one JSON tree and applies requests to it the way
//! the Realtime Database does: PUT replaces, PATCH merges top-level fields
//! (a `null` field deletes), POST adds a child under a generated key, and
//! DELETE removes. Every request is logged, failures can be injected per
//! verb, and requests can be held back and released in any order to stage
//! races. That makes it the store of choice for tests and the demo mode.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::sync::{Notify, oneshot};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::remote::{Method, RemoteStore};

/// A request as seen by the [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// The verb.
    pub method: Method,
    /// The normalized path, without leading or trailing slashes.
    pub path: String,
    /// The JSON body, for writes.
    pub body: Option<Value>,
}

#[derive(Debug)]
struct Held {
    request: Request,
    release: oneshot::Sender<()>,
}

#[derive(Debug, Default)]
struct State {
    root: Value,
    log: Vec<Request>,
    failing: HashSet<Method>,
    holding: HashSet<Method>,
    held: Vec<Held>,
    next_key: u64,
}

/// An in-memory [`RemoteStore`].
///
/// # Examples
///
/// ```
/// use join_store::{MemoryStore, Method, RemoteStore};
/// use serde_json::json;
///
/// # tokio_test(async {
/// let store = MemoryStore::new();
/// let created = store.post("tasks", &json!({ "title": "T" })).await.unwrap();
/// let key = created["name"].as_str().unwrap();
///
/// let task = store.get(&format!("tasks/{key}")).await.unwrap();
/// assert_eq!(task["title"], "T");
/// assert_eq!(store.count(Method::Post), 1);
/// # });
/// # fn tokio_test(f: impl std::future::Future<Output = ()>) {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    held_changed: Notify,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose root holds `root`.
    ///
    /// # Examples
    ///
    /// ```
    /// use join_store::MemoryStore;
    /// use serde_json::json;
    ///
    /// let store = MemoryStore::with_root(json!({ "tasks": { "-Na": { "title": "T" } } }));
    /// assert_eq!(store.value_at("tasks/-Na/title"), json!("T"));
    /// ```
    #[must_use]
    pub fn with_root(root: Value) -> Self {
        let store = Self::new();
        store.state().root = root;
        store
    }

    /// Returns the current value at `path`, bypassing the request log.
    #[must_use]
    pub fn value_at(&self, path: &str) -> Value {
        lookup(&self.state().root, &segments(path))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Makes every following request with `method` fail with
    /// `503 Service Unavailable` until [`heal`](Self::heal) is called.
    ///
    /// Failed requests are logged but change nothing.
    pub fn fail(&self, method: Method) {
        self.state().failing.insert(method);
    }

    /// Stops all injected failures.
    pub fn heal(&self) {
        self.state().failing.clear();
    }

    /// Parks every following request with `method` until it is released
    /// with [`release`](Self::release) or [`release_all`](Self::release_all).
    ///
    /// A held request is applied and logged when it is released, so the
    /// release order decides the final state.
    pub fn hold(&self, method: Method) {
        self.state().holding.insert(method);
    }

    /// Returns the parked requests, in arrival order.
    #[must_use]
    pub fn held(&self) -> Vec<Request> {
        self.state().held.iter().map(|h| h.request.clone()).collect()
    }

    /// Waits until at least `count` requests are parked.
    pub async fn until_held(&self, count: usize) {
        loop {
            let changed = self.held_changed.notified();
            let held = self.state().held.len();
            if held >= count {
                return;
            }
            changed.await;
        }
    }

    /// Lets the parked request at `index` (in arrival order) proceed and
    /// returns it, or `None` if there is no such request.
    pub fn release(&self, index: usize) -> Option<Request> {
        let mut state = self.state();
        if index >= state.held.len() {
            return None;
        }
        let held = state.held.remove(index);
        let _ = held.release.send(());
        Some(held.request)
    }

    /// Stops holding requests and lets every parked one proceed.
    pub fn release_all(&self) {
        let mut state = self.state();
        state.holding.clear();
        for held in state.held.drain(..) {
            let _ = held.release.send(());
        }
    }

    /// Returns every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.state().log.clone()
    }

    /// Returns the number of requests received with `method`.
    #[must_use]
    pub fn count(&self, method: Method) -> usize {
        self.state()
            .log
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    /// Forgets the request log.
    pub fn clear_requests(&self) {
        self.state().log.clear();
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let parts = segments(path);
        let request = Request {
            method,
            path: parts.join("/"),
            body: body.cloned(),
        };

        let parked = {
            let mut state = self.state();
            state.holding.contains(&method).then(|| {
                let (release, parked) = oneshot::channel();
                state.held.push(Held {
                    request: request.clone(),
                    release,
                });
                parked
            })
        };
        if let Some(parked) = parked {
            debug!(%method, path, "holding store request");
            self.held_changed.notify_waiters();
            // A dropped sender also lets the request through.
            let _ = parked.await;
        }

        let mut state = self.state();
        state.log.push(request);

        if state.failing.contains(&method) {
            debug!(%method, path, "injected store failure");
            return Err(StoreError::Status {
                url: parts.join("/"),
                status: 503,
                status_text: "Service Unavailable".to_string(),
            });
        }

        let body = body.cloned().unwrap_or(Value::Null);
        let response = match method {
            Method::Get => lookup(&state.root, &parts).cloned().unwrap_or(Value::Null),
            Method::Put => {
                write(&mut state.root, &parts, body.clone());
                body
            }
            Method::Patch => {
                if let Value::Object(fields) = &body {
                    for (key, value) in fields {
                        let mut child = parts.clone();
                        child.push(key);
                        write(&mut state.root, &child, value.clone());
                    }
                }
                body
            }
            Method::Post => {
                state.next_key += 1;
                let key = format!("-Nmem{:06}", state.next_key);
                let mut child = parts.clone();
                child.push(&key);
                write(&mut state.root, &child, body);
                json!({ "name": key })
            }
            Method::Delete => {
                write(&mut state.root, &parts, Value::Null);
                Value::Null
            }
        };
        debug!(%method, path, "memory store request");
        Ok(response)
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn lookup<'a>(root: &'a Value, parts: &[&str]) -> Option<&'a Value> {
    parts.iter().try_fold(root, |node, part| match node {
        Value::Object(map) => map.get(*part),
        Value::Array(items) => items.get(part.parse::<usize>().ok()?),
        _ => None,
    })
}

/// Stores `value` at `parts`, creating objects on the way. `null` and
/// empty objects remove the entry instead, and parents left empty are
/// removed with it.
fn write(node: &mut Value, parts: &[&str], value: Value) {
    let Some((first, rest)) = parts.split_first() else {
        *node = if is_empty(&value) { Value::Null } else { value };
        return;
    };

    if !node.is_object() {
        if is_empty(&value) {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    let child = map.entry((*first).to_string()).or_insert(Value::Null);
    write(child, rest, value);
    if child.is_null() {
        map.remove(*first);
    }
    if map.is_empty() {
        *node = Value::Null;
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn get_missing_is_null() {
        let store = MemoryStore::new();
        assert_eq!(store.get("tasks").await.unwrap(), Value::Null);
        assert_eq!(store.get("tasks/-Nx").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn put_replaces_whole_record() {
        let store = MemoryStore::with_root(json!({
            "tasks": { "-Na": { "title": "Old", "description": "gone" } }
        }));
        store.put("tasks/-Na", &json!({ "title": "New" })).await.unwrap();

        assert_eq!(store.value_at("tasks/-Na"), json!({ "title": "New" }));
    }

    #[tokio::test]
    async fn patch_merges_top_level_fields() {
        let store = MemoryStore::with_root(json!({
            "tasks": { "-Na": { "title": "T", "description": "keep", "priority": "Low" } }
        }));
        store
            .patch("tasks/-Na", &json!({ "priority": "Urgent", "description": null }))
            .await
            .unwrap();

        assert_eq!(
            store.value_at("tasks/-Na"),
            json!({ "title": "T", "priority": "Urgent" })
        );
    }

    #[tokio::test]
    async fn patch_replaces_arrays_wholesale() {
        let store = MemoryStore::with_root(json!({
            "tasks": { "-Na": { "subtasks": [{ "text": "a" }, { "text": "b" }] } }
        }));
        store
            .patch("tasks/-Na", &json!({ "subtasks": [{ "text": "c" }] }))
            .await
            .unwrap();

        assert_eq!(store.value_at("tasks/-Na/subtasks"), json!([{ "text": "c" }]));
        assert_eq!(store.value_at("tasks/-Na/subtasks/0/text"), json!("c"));
    }

    #[tokio::test]
    async fn post_generates_ordered_keys() {
        let store = MemoryStore::new();
        let first = store.post("tasks", &json!({ "title": "1" })).await.unwrap();
        let second = store.post("tasks", &json!({ "title": "2" })).await.unwrap();

        let first = first["name"].as_str().unwrap().to_string();
        let second = second["name"].as_str().unwrap().to_string();
        assert!(first < second);
        assert_eq!(store.value_at(&format!("tasks/{second}/title")), json!("2"));
    }

    #[tokio::test]
    async fn delete_prunes_empty_parents() {
        let store = MemoryStore::with_root(json!({ "tasks": { "-Na": { "title": "T" } } }));
        store.delete("tasks/-Na").await.unwrap();

        assert_eq!(store.get("tasks").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn injected_failure_changes_nothing() {
        let store = MemoryStore::with_root(json!({ "tasks": { "-Na": { "title": "T" } } }));
        store.fail(Method::Delete);

        let err = store.delete("tasks/-Na").await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(store.value_at("tasks/-Na/title"), json!("T"));
        assert_eq!(store.count(Method::Delete), 1);

        store.heal();
        store.delete("tasks/-Na").await.unwrap();
        assert_eq!(store.value_at("tasks/-Na"), Value::Null);
    }

    #[tokio::test]
    async fn held_requests_apply_in_release_order() {
        let store = Arc::new(MemoryStore::with_root(json!({ "tasks": { "-Na": { "title": "T" } } })));
        store.hold(Method::Put);

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.put("tasks/-Na/title", &json!("first")).await }
        });
        store.until_held(1).await;
        let second = tokio::spawn({
            let store = store.clone();
            async move { store.put("tasks/-Na/title", &json!("second")).await }
        });
        store.until_held(2).await;

        assert_eq!(store.count(Method::Put), 0);
        assert_eq!(store.value_at("tasks/-Na/title"), json!("T"));
        assert_eq!(store.get("tasks/-Na/title").await.unwrap(), json!("T"));

        let released = store.release(1).unwrap();
        assert_eq!(released.body, Some(json!("second")));
        second.await.unwrap().unwrap();
        assert_eq!(store.value_at("tasks/-Na/title"), json!("second"));

        store.release_all();
        first.await.unwrap().unwrap();
        assert_eq!(store.value_at("tasks/-Na/title"), json!("first"));
        assert!(store.held().is_empty());
        assert!(store.release(0).is_none());

        store.put("tasks/-Na/title", &json!("free")).await.unwrap();
        assert_eq!(store.count(Method::Put), 3);
    }

    #[tokio::test]
    async fn log_records_normalized_paths_and_bodies() {
        let store = MemoryStore::new();
        store.put("/tasks/-Na/", &json!({ "title": "T" })).await.unwrap();
        store.get("tasks").await.unwrap();

        let log = store.requests();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].method, Method::Put);
        assert_eq!(log[0].path, "tasks/-Na");
        assert_eq!(log[0].body, Some(json!({ "title": "T" })));
        assert_eq!(log[1].body, None);

        store.clear_requests();
        assert!(store.requests().is_empty());
    }
}
