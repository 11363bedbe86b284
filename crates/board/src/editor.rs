//! Subtask editing.
//!
//! Every mutation is applied to the local task and then persisted right
//! away by writing the whole `subtasks` array with PATCH. Invalid input
//! (blank text, a subtask that is not there) is reported as
//! [`SubtaskOutcome::Skipped`] and sends nothing.

use join_protocol::{Subtask, SubtaskId, SubtaskKey, TaskId, TaskPatch};
use tracing::{debug, instrument};

use crate::error::{BoardError, Result};
use crate::repository::TaskRepository;

/// Where a subtask sits after a successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtaskHandle {
    /// Position at the time of the mutation.
    pub index: usize,
    /// Stable id; `None` only for legacy subtasks not yet repaired.
    pub id: Option<SubtaskId>,
}

impl SubtaskHandle {
    /// Returns the most stable key for the subtask.
    #[must_use]
    pub fn key(self) -> SubtaskKey {
        self.id.map_or(SubtaskKey::Index(self.index), SubtaskKey::Id)
    }
}

/// Why a subtask operation did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The text was empty after trimming.
    EmptyText,
    /// No subtask matches the key.
    NoSuchSubtask(SubtaskKey),
}

/// Result of a subtask operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtaskOutcome {
    /// The change was applied and persisted.
    Applied(SubtaskHandle),
    /// Nothing was changed or sent.
    Skipped(SkipReason),
}

impl SubtaskOutcome {
    /// Returns the handle if the change was applied.
    #[must_use]
    pub fn applied(self) -> Option<SubtaskHandle> {
        match self {
            Self::Applied(handle) => Some(handle),
            Self::Skipped(_) => None,
        }
    }
}

/// Inline edit state for one subtask.
///
/// The session refers to the subtask by id, so removing an earlier subtask
/// while editing cannot redirect the save to a different one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    task_id: TaskId,
    subtask: SubtaskId,
    draft: String,
}

impl EditSession {
    /// Returns the task being edited.
    #[must_use]
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the subtask being edited.
    #[must_use]
    pub fn subtask(&self) -> SubtaskId {
        self.subtask
    }

    /// Returns the current draft text.
    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Replaces the draft text.
    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }
}

/// Applies subtask mutations through a [`TaskRepository`].
#[derive(Debug, Clone)]
pub struct SubtaskEditor {
    repo: TaskRepository,
}

impl SubtaskEditor {
    /// Creates an editor working on `repo`.
    #[must_use]
    pub fn new(repo: TaskRepository) -> Self {
        Self { repo }
    }

    /// Appends an open subtask with the trimmed `text`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] if the task is not loaded, or
    /// the store error if persisting fails (the local append stays).
    #[instrument(skip(self), fields(task_id = %task_id))]
    pub async fn append(&self, task_id: &TaskId, text: &str) -> Result<SubtaskOutcome> {
        let Ok(subtask) = Subtask::new(text) else {
            debug!("ignoring blank subtask");
            return Ok(SubtaskOutcome::Skipped(SkipReason::EmptyText));
        };

        let handle = SubtaskHandle {
            index: 0,
            id: subtask.id,
        };
        let (handle, subtasks) = self
            .repo
            .modify(task_id, |task| {
                task.subtasks.push(subtask);
                let index = task.subtasks.len() - 1;
                (SubtaskHandle { index, ..handle }, task.subtasks.clone())
            })
            .await?;

        self.persist(task_id, subtasks).await?;
        Ok(SubtaskOutcome::Applied(handle))
    }

    /// Replaces the text of a subtask with the trimmed `text`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] if the task is not loaded, or
    /// the store error if persisting fails.
    #[instrument(skip(self), fields(task_id = %task_id, key = %key))]
    pub async fn edit_text(
        &self,
        task_id: &TaskId,
        key: SubtaskKey,
        text: &str,
    ) -> Result<SubtaskOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SubtaskOutcome::Skipped(SkipReason::EmptyText));
        }

        let changed = self
            .repo
            .modify(task_id, |task| {
                let index = key.resolve(&task.subtasks)?;
                let subtask = &mut task.subtasks[index];
                subtask.text = text.to_string();
                let handle = SubtaskHandle {
                    index,
                    id: subtask.id,
                };
                Some((handle, task.subtasks.clone()))
            })
            .await?;

        self.persist_change(task_id, key, changed).await
    }

    /// Flips the completion flag of a subtask.
    ///
    /// The task is fetched fresh from the store first and the key is
    /// resolved against the fresh subtasks, so changes made elsewhere are
    /// kept. After persisting, the local subtasks are replaced with the
    /// fresh ones; this is skipped if the task was removed locally meanwhile.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::RemoteTaskMissing`] if the task is gone
    /// remotely, or the store error if fetching or persisting fails.
    #[instrument(skip(self), fields(task_id = %task_id, key = %key))]
    pub async fn toggle_completed(
        &self,
        task_id: &TaskId,
        key: SubtaskKey,
    ) -> Result<SubtaskOutcome> {
        let fresh = self
            .repo
            .get_one(task_id)
            .await?
            .ok_or_else(|| BoardError::RemoteTaskMissing(task_id.clone()))?;

        let mut subtasks = fresh.subtasks;
        let Some(index) = key.resolve(&subtasks) else {
            return Ok(SubtaskOutcome::Skipped(SkipReason::NoSuchSubtask(key)));
        };
        let subtask = &mut subtasks[index];
        subtask.completed = !subtask.completed;
        let handle = SubtaskHandle {
            index,
            id: subtask.id,
        };

        self.repo
            .send_patch(task_id, &TaskPatch::subtasks(subtasks.clone()))
            .await?;
        if !self.repo.replace_subtasks(task_id, subtasks).await {
            debug!("task no longer loaded, skipping local update");
        }
        Ok(SubtaskOutcome::Applied(handle))
    }

    /// Removes a subtask; later subtasks move up by one.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] if the task is not loaded, or
    /// the store error if persisting fails.
    #[instrument(skip(self), fields(task_id = %task_id, key = %key))]
    pub async fn remove(&self, task_id: &TaskId, key: SubtaskKey) -> Result<SubtaskOutcome> {
        let changed = self
            .repo
            .modify(task_id, |task| {
                let index = key.resolve(&task.subtasks)?;
                let removed = task.subtasks.remove(index);
                let handle = SubtaskHandle {
                    index,
                    id: removed.id,
                };
                Some((handle, task.subtasks.clone()))
            })
            .await?;

        self.persist_change(task_id, key, changed).await
    }

    /// Starts editing a subtask inline, with its current text as draft.
    ///
    /// A legacy subtask without an id is given one locally; it is written
    /// with the next persist.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] if the task is not loaded.
    pub async fn begin_edit(&self, task_id: &TaskId, key: SubtaskKey) -> Result<Option<EditSession>> {
        self.repo
            .modify(task_id, |task| {
                let index = key.resolve(&task.subtasks)?;
                let subtask = &mut task.subtasks[index];
                subtask.ensure_id();
                Some(EditSession {
                    task_id: task_id.clone(),
                    subtask: subtask.id?,
                    draft: subtask.text.clone(),
                })
            })
            .await
    }

    /// Saves the draft of an edit session as the new subtask text.
    ///
    /// # Errors
    ///
    /// See [`edit_text`](Self::edit_text).
    pub async fn save_edit(&self, session: &EditSession) -> Result<SubtaskOutcome> {
        self.edit_text(&session.task_id, SubtaskKey::Id(session.subtask), &session.draft)
            .await
    }

    async fn persist_change(
        &self,
        task_id: &TaskId,
        key: SubtaskKey,
        changed: Option<(SubtaskHandle, Vec<Subtask>)>,
    ) -> Result<SubtaskOutcome> {
        let Some((handle, subtasks)) = changed else {
            debug!("no such subtask");
            return Ok(SubtaskOutcome::Skipped(SkipReason::NoSuchSubtask(key)));
        };
        self.persist(task_id, subtasks).await?;
        Ok(SubtaskOutcome::Applied(handle))
    }

    async fn persist(&self, task_id: &TaskId, subtasks: Vec<Subtask>) -> Result<()> {
        self.repo
            .send_patch(task_id, &TaskPatch::subtasks(subtasks))
            .await
    }
}
