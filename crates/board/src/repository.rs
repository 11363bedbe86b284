//! The task repository: sole owner of the in-memory task mapping.
//!
//! Every mutation changes the local mapping and the remote store, in the
//! order each operation documents. The mapping lock is released before any
//! store request, so concurrent operations interleave freely and the last
//! completed write wins, locally and remotely. Nothing is rolled back.

use std::sync::Arc;

use chrono::Utc;
use join_protocol::{
    MainCategory, ProtocolError, Subtask, Task, TaskId, TaskMap, TaskPatch, decode_collection,
};
use join_store::{RemoteStore, join_path};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::error::{BoardError, Result};

/// What a full load brought in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Tasks now in the local mapping.
    pub loaded: usize,
    /// Records skipped because they failed to decode.
    pub rejected: usize,
}

/// What the startup repair pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepairReport {
    /// Tasks that were patched successfully.
    pub repaired: usize,
    /// Tasks whose patch failed; their local repair is kept.
    pub failed: usize,
}

/// Shared handle to the task mapping and the store it mirrors.
///
/// Cloning is cheap; all clones see the same mapping.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use join_board::TaskRepository;
/// use join_protocol::{MainCategory, Task, TaskCategory};
/// use join_store::MemoryStore;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let repo = TaskRepository::new(Arc::new(MemoryStore::new()), "tasks");
/// let id = repo.create(Task::new("Write docs", TaskCategory::TechnicalTask)).await.unwrap();
///
/// repo.set_status(&id, MainCategory::Done).await.unwrap();
/// assert_eq!(repo.task(&id).await.unwrap().main_category, Some(MainCategory::Done));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TaskRepository {
    store: Arc<dyn RemoteStore>,
    collection: String,
    tasks: Arc<RwLock<TaskMap>>,
}

impl TaskRepository {
    /// Creates an empty repository for the collection at `collection`.
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            tasks: Arc::default(),
        }
    }

    /// Returns the store this repository writes to.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    /// Returns the collection path.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn task_path(&self, id: &TaskId) -> String {
        join_path(&[&self.collection, id.as_str()])
    }

    /// Fetches the whole collection and replaces the local mapping with it.
    ///
    /// Records that fail to decode are skipped with a warning. On failure
    /// the previous mapping is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the collection is not an
    /// object.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn load_all(&self) -> Result<LoadReport> {
        let value = self.store.get(&self.collection).await.inspect_err(|e| {
            warn!(error = %e, "failed to load tasks, keeping previous state");
        })?;
        let decoded = decode_collection(value)?;
        for rejected in &decoded.rejected {
            warn!(error = %rejected, "skipping unreadable task record");
        }

        let report = LoadReport {
            loaded: decoded.tasks.len(),
            rejected: decoded.rejected.len(),
        };
        *self.tasks.write().await = decoded.tasks;
        info!(loaded = report.loaded, rejected = report.rejected, "tasks loaded");
        Ok(report)
    }

    /// Fetches one task fresh from the store. The local mapping is neither
    /// consulted nor updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the record does not decode.
    #[instrument(skip(self), fields(task_id = %id))]
    pub async fn get_one(&self, id: &TaskId) -> Result<Option<Task>> {
        match self.store.get(&self.task_path(id)).await? {
            Value::Null => {
                debug!("task not found remotely");
                Ok(None)
            }
            value => Ok(Some(Task::from_value(id, value)?)),
        }
    }

    /// Moves a task to another column, then writes the full record with PUT.
    ///
    /// The local change stays even if the write fails.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] without sending anything if the
    /// task is not loaded, or the store error if the write fails.
    #[instrument(skip(self), fields(task_id = %id, status = %status))]
    pub async fn set_status(&self, id: &TaskId, status: MainCategory) -> Result<()> {
        let record = self
            .modify(id, |task| {
                task.main_category = Some(status);
                task.to_value()
            })
            .await??;

        self.store
            .put(&self.task_path(id), &record)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to persist status change"))?;
        debug!("status persisted");
        Ok(())
    }

    /// Deletes a task remotely, then locally.
    ///
    /// Returns the removed local task, if it was loaded.
    ///
    /// # Errors
    ///
    /// Returns the store error if the delete fails; the local mapping is
    /// left untouched in that case.
    #[instrument(skip(self), fields(task_id = %id))]
    pub async fn delete_one(&self, id: &TaskId) -> Result<Option<Task>> {
        self.store
            .delete(&self.task_path(id))
            .await
            .inspect_err(|e| warn!(error = %e, "failed to delete task"))?;
        let removed = self.tasks.write().await.remove(id);
        info!(was_loaded = removed.is_some(), "task deleted");
        Ok(removed)
    }

    /// Writes only the fields named in `patch`, then applies them to the
    /// local task if it is still loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch is invalid or the write fails.
    #[instrument(skip(self, patch), fields(task_id = %id))]
    pub async fn persist_patch(&self, id: &TaskId, patch: &TaskPatch) -> Result<()> {
        self.send_patch(id, patch).await?;
        if let Some(task) = self.tasks.write().await.get_mut(id) {
            task.apply(patch);
        }
        Ok(())
    }

    /// Saves the fields edited in the task form.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] if the task is not loaded, a
    /// validation error for a blank title, or the store error.
    pub async fn update_fields(&self, id: &TaskId, patch: &TaskPatch) -> Result<()> {
        if !self.tasks.read().await.contains_key(id) {
            return Err(BoardError::TaskNotFound(id.clone()));
        }
        self.persist_patch(id, patch).await
    }

    /// Creates a task remotely and inserts it under the key the store
    /// generated.
    ///
    /// Tasks without a column land in `ToDo`; a missing creation time is set
    /// to now; subtasks get stable ids.
    ///
    /// # Errors
    ///
    /// Returns a validation error, the store error, or
    /// [`BoardError::MissingCreatedKey`] if the answer has no `name`.
    #[instrument(skip(self, task), fields(title = %task.title))]
    pub async fn create(&self, mut task: Task) -> Result<TaskId> {
        task.validate()?;
        task.main_category.get_or_insert(MainCategory::ToDo);
        task.created_at.get_or_insert_with(Utc::now);
        task.ensure_subtask_ids();

        let answer = self.store.post(&self.collection, &task.to_value()?).await?;
        let id = answer
            .get("name")
            .and_then(Value::as_str)
            .map(TaskId::from)
            .ok_or(BoardError::MissingCreatedKey)?;

        self.tasks.write().await.insert(id.clone(), task);
        info!(task_id = %id, "task created");
        Ok(id)
    }

    /// Repairs legacy records: tasks without a column are put in `ToDo`
    /// and subtasks without an id get one.
    ///
    /// Each affected task is changed locally and receives exactly one PATCH
    /// naming only the repaired fields. Failed patches are logged and
    /// counted; the local repair is kept.
    #[instrument(skip(self))]
    pub async fn repair(&self) -> RepairReport {
        let patches: Vec<(TaskId, TaskPatch)> = {
            let mut tasks = self.tasks.write().await;
            tasks
                .iter_mut()
                .filter_map(|(id, task)| repair_task(task).map(|patch| (id.clone(), patch)))
                .collect()
        };

        let mut report = RepairReport::default();
        for (id, patch) in patches {
            match self.send_patch(&id, &patch).await {
                Ok(()) => report.repaired += 1,
                Err(e) => {
                    warn!(task_id = %id, error = %e, "failed to persist repair");
                    report.failed += 1;
                }
            }
        }
        if report.repaired + report.failed > 0 {
            info!(repaired = report.repaired, failed = report.failed, "repaired legacy tasks");
        }
        report
    }

    /// Returns a copy of the whole mapping.
    pub async fn snapshot(&self) -> TaskMap {
        self.tasks.read().await.clone()
    }

    /// Returns a copy of one loaded task.
    pub async fn task(&self, id: &TaskId) -> Option<Task> {
        self.tasks.read().await.get(id).cloned()
    }

    /// Returns the number of loaded tasks.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Returns `true` if no task is loaded.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Runs `f` on a loaded task under the write lock.
    pub(crate) async fn modify<R>(&self, id: &TaskId, f: impl FnOnce(&mut Task) -> R) -> Result<R> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| BoardError::TaskNotFound(id.clone()))?;
        Ok(f(task))
    }

    /// Replaces the local subtasks of a task, if it is still loaded.
    pub(crate) async fn replace_subtasks(&self, id: &TaskId, subtasks: Vec<Subtask>) -> bool {
        match self.tasks.write().await.get_mut(id) {
            Some(task) => {
                task.subtasks = subtasks;
                true
            }
            None => false,
        }
    }

    /// Sends a PATCH without touching the local mapping.
    pub(crate) async fn send_patch(&self, id: &TaskId, patch: &TaskPatch) -> Result<()> {
        patch.validate()?;
        let body = serde_json::to_value(patch).map_err(ProtocolError::SerializationFailed)?;
        self.store
            .patch(&self.task_path(id), &body)
            .await
            .inspect_err(|e| warn!(task_id = %id, error = %e, "failed to persist patch"))?;
        Ok(())
    }
}

/// Repairs one task in place and returns the patch describing the change.
fn repair_task(task: &mut Task) -> Option<TaskPatch> {
    let mut patch = TaskPatch::default();
    if task.main_category.is_none() {
        task.main_category = Some(MainCategory::ToDo);
        patch.main_category = Some(MainCategory::ToDo);
    }
    if task.ensure_subtask_ids() {
        patch.subtasks = Some(task.subtasks.clone());
    }
    (!patch.is_empty()).then_some(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use join_protocol::TaskCategory;
    use join_store::{MemoryStore, Method};
    use serde_json::json;

    fn repo_with(root: Value) -> (Arc<MemoryStore>, TaskRepository) {
        let store = Arc::new(MemoryStore::with_root(root));
        let repo = TaskRepository::new(store.clone(), "tasks");
        (store, repo)
    }

    fn record(title: &str, column: &str) -> Value {
        json!({ "title": title, "category": "User Story", "mainCategory": column })
    }

    #[tokio::test]
    async fn load_all_replaces_mapping_and_skips_bad_records() {
        let (_, repo) = repo_with(json!({ "tasks": {
            "-Na": record("A", "ToDo"),
            "-Nb": { "category": "User Story" },
        }}));

        let report = repo.load_all().await.unwrap();
        assert_eq!(report, LoadReport { loaded: 1, rejected: 1 });
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn load_all_of_null_is_empty() {
        let (_, repo) = repo_with(Value::Null);
        assert_eq!(repo.load_all().await.unwrap().loaded, 0);
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_mapping() {
        let (store, repo) = repo_with(json!({ "tasks": { "-Na": record("A", "ToDo") } }));
        repo.load_all().await.unwrap();

        store.fail(Method::Get);
        assert!(repo.load_all().await.is_err());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn get_one_bypasses_local_mapping() {
        let (store, repo) = repo_with(json!({ "tasks": { "-Na": record("A", "ToDo") } }));
        repo.load_all().await.unwrap();
        store
            .patch("tasks/-Na", &json!({ "title": "Changed elsewhere" }))
            .await
            .unwrap();

        let fresh = repo.get_one(&TaskId::new("-Na")).await.unwrap().unwrap();
        assert_eq!(fresh.title, "Changed elsewhere");
        assert_eq!(repo.task(&TaskId::new("-Na")).await.unwrap().title, "A");
        assert!(repo.get_one(&TaskId::new("-Nzz")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_status_puts_full_record() {
        let (store, repo) = repo_with(json!({ "tasks": { "-Na": record("A", "ToDo") } }));
        repo.load_all().await.unwrap();
        let id = TaskId::new("-Na");

        repo.set_status(&id, MainCategory::AwaitFeedback).await.unwrap();

        let put = store.requests().pop().unwrap();
        assert_eq!(put.method, Method::Put);
        assert_eq!(put.path, "tasks/-Na");
        assert_eq!(put.body.unwrap()["title"], "A");
        assert_eq!(store.value_at("tasks/-Na/mainCategory"), json!("AwaitFeedback"));
    }

    #[tokio::test]
    async fn set_status_on_unknown_task_sends_nothing() {
        let (store, repo) = repo_with(Value::Null);
        let err = repo
            .set_status(&TaskId::new("-Nx"), MainCategory::Done)
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::TaskNotFound(_)));
        assert!(store.requests().is_empty());
    }

    #[tokio::test]
    async fn failed_set_status_keeps_local_change() {
        let (store, repo) = repo_with(json!({ "tasks": { "-Na": record("A", "ToDo") } }));
        repo.load_all().await.unwrap();
        store.fail(Method::Put);
        let id = TaskId::new("-Na");

        assert!(repo.set_status(&id, MainCategory::Done).await.is_err());
        assert_eq!(repo.task(&id).await.unwrap().main_category, Some(MainCategory::Done));
        assert_eq!(store.value_at("tasks/-Na/mainCategory"), json!("ToDo"));
    }

    #[tokio::test]
    async fn persist_patch_applies_locally_after_success() {
        let (store, repo) = repo_with(json!({ "tasks": { "-Na": record("A", "ToDo") } }));
        repo.load_all().await.unwrap();
        let id = TaskId::new("-Na");
        let patch = TaskPatch {
            description: Some("details".to_string()),
            ..TaskPatch::default()
        };

        repo.persist_patch(&id, &patch).await.unwrap();
        assert_eq!(repo.task(&id).await.unwrap().description, "details");
        assert_eq!(store.value_at("tasks/-Na/description"), json!("details"));

        store.fail(Method::Patch);
        let patch = TaskPatch {
            description: Some("lost".to_string()),
            ..TaskPatch::default()
        };
        assert!(repo.persist_patch(&id, &patch).await.is_err());
        assert_eq!(repo.task(&id).await.unwrap().description, "details");
    }

    #[tokio::test]
    async fn update_fields_rejects_blank_title() {
        let (store, repo) = repo_with(json!({ "tasks": { "-Na": record("A", "ToDo") } }));
        repo.load_all().await.unwrap();
        let patch = TaskPatch {
            title: Some("  ".to_string()),
            ..TaskPatch::default()
        };

        assert!(repo.update_fields(&TaskId::new("-Na"), &patch).await.is_err());
        assert!(
            repo.update_fields(&TaskId::new("-Nx"), &TaskPatch::default())
                .await
                .is_err()
        );
        assert_eq!(store.count(Method::Patch), 0);
    }

    #[tokio::test]
    async fn create_inserts_under_generated_key() {
        let (store, repo) = repo_with(Value::Null);
        let mut task = Task::new("New", TaskCategory::UserStory);
        task.main_category = None;
        task.created_at = None;
        task.subtasks.push(Subtask {
            id: None,
            text: "first".to_string(),
            completed: false,
        });

        let id = repo.create(task).await.unwrap();

        let local = repo.task(&id).await.unwrap();
        assert_eq!(local.main_category, Some(MainCategory::ToDo));
        assert!(local.created_at.is_some());
        assert!(local.subtasks[0].id.is_some());
        assert_eq!(
            store.value_at(&format!("tasks/{id}/mainCategory")),
            json!("ToDo")
        );
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let (store, repo) = repo_with(Value::Null);
        let err = repo
            .create(Task::new(" ", TaskCategory::UserStory))
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Protocol(_)));
        assert!(store.requests().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_remote_then_local() {
        let (store, repo) = repo_with(json!({ "tasks": { "-Na": record("A", "ToDo") } }));
        repo.load_all().await.unwrap();

        let removed = repo.delete_one(&TaskId::new("-Na")).await.unwrap();
        assert_eq!(removed.unwrap().title, "A");
        assert!(repo.is_empty().await);
        assert_eq!(store.value_at("tasks/-Na"), Value::Null);
    }

    #[tokio::test]
    async fn repair_patches_each_legacy_task_once() {
        let (store, repo) = repo_with(json!({ "tasks": {
            "-Na": { "title": "A", "category": "User Story" },
            "-Nb": record("B", "Done"),
            "-Nc": { "title": "C", "category": "User Story", "subtasks": [{ "text": "s" }] },
        }}));
        repo.load_all().await.unwrap();
        store.clear_requests();

        let report = repo.repair().await;

        assert_eq!(report, RepairReport { repaired: 2, failed: 0 });
        let patches = store.requests();
        assert_eq!(patches.len(), 2);
        assert!(patches.iter().all(|r| r.method == Method::Patch));
        assert_eq!(patches[0].path, "tasks/-Na");
        assert_eq!(patches[0].body, Some(json!({ "mainCategory": "ToDo" })));
        assert!(patches[1].body.as_ref().unwrap()["subtasks"][0]["id"].is_string());

        assert_eq!(repo.repair().await, RepairReport::default());
        assert_eq!(store.requests().len(), 2);
    }
}
