//! The intent dispatcher.
//!
//! [`Board`] owns the UI-facing state of one board page: the drag in
//! progress, the open detail overlay, the inline subtask editor, and the
//! search query. It turns [`Intent`]s into repository operations and
//! republishes the [`BoardView`] after each one.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use join_protocol::{
    BoardSummary, BoardView, ContactDirectory, Intent, MainCategory, NoContacts, Task, TaskId,
};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::dragdrop::{DragDropController, DragState, DropOutcome, DropZones};
use crate::editor::{EditSession, SkipReason, SubtaskEditor, SubtaskOutcome};
use crate::error::{BoardError, Result};
use crate::repository::{LoadReport, RepairReport, TaskRepository};

/// The detail overlay of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailOverlay {
    /// The task shown.
    pub id: TaskId,
    /// The task as of the last refresh.
    pub task: Task,
}

/// What a dispatched intent did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The collection was reloaded.
    Loaded(LoadReport),
    /// Legacy tasks were repaired.
    Repaired(RepairReport),
    /// A task was created under the given key.
    Created(TaskId),
    /// Edited fields were saved.
    Updated(TaskId),
    /// A task was deleted.
    Deleted(TaskId),
    /// A task was moved with the category-switch control.
    Moved {
        /// The moved task.
        id: TaskId,
        /// Its new column.
        category: MainCategory,
    },
    /// A drag ended with a drop.
    Dropped(DropOutcome),
    /// A subtask operation ran.
    Subtask(SubtaskOutcome),
    /// Only UI state changed.
    Ui,
    /// The operation failed; the board kept going.
    Failed(String),
}

impl Outcome {
    /// Returns the confirmation shown to the user, if the outcome has one.
    ///
    /// # Examples
    ///
    /// ```
    /// use join_board::Outcome;
    /// use join_protocol::TaskId;
    ///
    /// assert_eq!(Outcome::Created(TaskId::new("-Na")).notice(), Some("Task added to board"));
    /// assert_eq!(Outcome::Ui.notice(), None);
    /// ```
    #[must_use]
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::Created(_) => Some("Task added to board"),
            Self::Updated(_) => Some("Task saved"),
            Self::Deleted(_) => Some("Task deleted"),
            _ => None,
        }
    }

    /// Returns `true` for [`Outcome::Failed`].
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// One board page: repository, controllers, and UI state.
///
/// Every method takes `&self`, so a board can be shared behind an `Arc` and
/// intents can overlap: a UI intent never waits for a write that is still
/// in flight. The UI state lock is never held across a store request.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use join_board::{Board, Outcome, TaskRepository};
/// use join_protocol::{Intent, MainCategory, dummy::sample_collection};
/// use join_store::MemoryStore;
/// use serde_json::json;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let store = MemoryStore::with_root(json!({ "tasks": sample_collection() }));
/// let board = Board::new(TaskRepository::new(Arc::new(store), "tasks"));
///
/// board.dispatch(Intent::Load).await.unwrap();
/// board.dispatch(Intent::Repair).await.unwrap();
/// assert_eq!(board.view().total_cards(), 7);
/// # });
/// ```
pub struct Board {
    repo: TaskRepository,
    editor: SubtaskEditor,
    dragdrop: DragDropController,
    ui: Mutex<UiState>,
    contacts: Arc<dyn ContactDirectory>,
    view_tx: watch::Sender<BoardView>,
}

#[derive(Debug, Default)]
struct UiState {
    session: Option<EditSession>,
    detail: Option<DetailOverlay>,
    query: String,
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ui = self.ui();
        f.debug_struct("Board")
            .field("repo", &self.repo)
            .field("drag", &self.dragdrop.state())
            .field("session", &ui.session)
            .field("detail", &ui.detail.as_ref().map(|d| &d.id))
            .field("query", &ui.query)
            .finish_non_exhaustive()
    }
}

impl Board {
    /// Creates a board on `repo` without contact colors.
    #[must_use]
    pub fn new(repo: TaskRepository) -> Self {
        let (view_tx, _) = watch::channel(BoardView::default());
        Self {
            editor: SubtaskEditor::new(repo.clone()),
            dragdrop: DragDropController::new(repo.clone()),
            repo,
            ui: Mutex::default(),
            contacts: Arc::new(NoContacts),
            view_tx,
        }
    }

    /// Uses `contacts` to color assignee avatars.
    #[must_use]
    pub fn with_contacts(mut self, contacts: Arc<dyn ContactDirectory>) -> Self {
        self.contacts = contacts;
        self
    }

    /// Returns the repository.
    #[must_use]
    pub fn repo(&self) -> &TaskRepository {
        &self.repo
    }

    /// Changes the drop zone registry.
    pub fn update_zones<R>(&self, f: impl FnOnce(&mut DropZones) -> R) -> R {
        self.dragdrop.update_zones(f)
    }

    /// Returns the drag state.
    #[must_use]
    pub fn drag_state(&self) -> DragState {
        self.dragdrop.state()
    }

    /// Returns the open detail overlay.
    #[must_use]
    pub fn detail(&self) -> Option<DetailOverlay> {
        self.ui().detail.clone()
    }

    /// Returns the inline subtask edit in progress.
    #[must_use]
    pub fn session(&self) -> Option<EditSession> {
        self.ui().session.clone()
    }

    /// Returns the current search query.
    #[must_use]
    pub fn query(&self) -> String {
        self.ui().query.clone()
    }

    /// Subscribes to board view updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BoardView> {
        self.view_tx.subscribe()
    }

    /// Returns the last published view.
    #[must_use]
    pub fn view(&self) -> BoardView {
        self.view_tx.borrow().clone()
    }

    /// Computes the summary counters over all loaded tasks.
    pub async fn summary(&self) -> BoardSummary {
        BoardSummary::from_tasks(self.repo.snapshot().await.values())
    }

    /// Rebuilds the view and notifies subscribers if it changed.
    ///
    /// Works without any subscriber.
    pub async fn publish(&self) {
        let query = self.query();
        let tasks = self.repo.snapshot().await;
        let view = BoardView::build(&tasks, &query, self.contacts.as_ref());
        let changed = self.view_tx.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
        debug!(changed, "board view published");
    }

    /// Handles one intent.
    ///
    /// Failures are logged and reported as [`Outcome::Failed`], except for
    /// deleting a task and toggling a subtask, whose errors are returned.
    /// The view is republished and the detail overlay refreshed either way.
    ///
    /// # Errors
    ///
    /// Returns the error of a failed [`Intent::DeleteTask`] or
    /// [`Intent::ToggleSubtask`].
    #[instrument(skip_all, fields(intent = intent_name(&intent), store = intent.touches_store()))]
    pub async fn dispatch(&self, intent: Intent) -> Result<Outcome> {
        // UI-only intents leave task data alone, so the overlay is current.
        let touched = intent
            .touches_store()
            .then(|| intent.task_id().cloned())
            .flatten();
        let result = self.update(intent).await;

        if let Some(id) = touched {
            self.refresh_detail(&id).await;
        }
        self.publish().await;
        result
    }

    async fn update(&self, intent: Intent) -> Result<Outcome> {
        let outcome = match intent {
            Intent::Load => absorb(self.repo.load_all().await.map(Outcome::Loaded)),
            Intent::Repair => Outcome::Repaired(self.repo.repair().await),
            Intent::CreateTask { task } => absorb(self.repo.create(task).await.map(Outcome::Created)),
            Intent::UpdateTask { id, patch } => absorb(
                self.repo
                    .update_fields(&id, &patch)
                    .await
                    .map(|()| Outcome::Updated(id)),
            ),
            Intent::DeleteTask { id } => {
                self.repo.delete_one(&id).await?;
                {
                    let mut ui = self.ui();
                    if ui.session.as_ref().is_some_and(|s| s.task_id() == &id) {
                        ui.session = None;
                    }
                }
                Outcome::Deleted(id)
            }
            Intent::MoveTo { id, category } => absorb(
                self.dragdrop
                    .move_to(&id, category)
                    .await
                    .map(|()| Outcome::Moved { id, category }),
            ),
            Intent::DragStart { id } => {
                self.dragdrop.start_drag(id);
                Outcome::Ui
            }
            Intent::DragCancel => {
                self.dragdrop.cancel();
                Outcome::Ui
            }
            Intent::Drop { zone } => Outcome::Dropped(self.dragdrop.drop_on(&zone).await),
            Intent::OpenTask { id } => match self.repo.task(&id).await {
                Some(task) => {
                    self.ui().detail = Some(DetailOverlay { id, task });
                    Outcome::Ui
                }
                None => absorb(Err(BoardError::TaskNotFound(id))),
            },
            Intent::CloseTask => {
                let mut ui = self.ui();
                ui.detail = None;
                ui.session = None;
                Outcome::Ui
            }
            Intent::AddSubtask { id, text } => {
                absorb(self.editor.append(&id, &text).await.map(Outcome::Subtask))
            }
            Intent::EditSubtask { id, key, text } => absorb(
                self.editor
                    .edit_text(&id, key, &text)
                    .await
                    .map(Outcome::Subtask),
            ),
            Intent::ToggleSubtask { id, key } => {
                Outcome::Subtask(self.editor.toggle_completed(&id, key).await?)
            }
            Intent::RemoveSubtask { id, key } => {
                absorb(self.editor.remove(&id, key).await.map(Outcome::Subtask))
            }
            Intent::BeginSubtaskEdit { id, key } => match self.editor.begin_edit(&id, key).await {
                Ok(Some(session)) => {
                    self.ui().session = Some(session);
                    Outcome::Ui
                }
                Ok(None) => Outcome::Subtask(SubtaskOutcome::Skipped(SkipReason::NoSuchSubtask(key))),
                Err(e) => absorb(Err(e)),
            },
            Intent::UpdateSubtaskDraft { text } => {
                if let Some(session) = &mut self.ui().session {
                    session.update_draft(text);
                }
                Outcome::Ui
            }
            Intent::SaveSubtaskEdit => {
                let session = self.ui().session.take();
                match session {
                    Some(session) => {
                        let outcome =
                            absorb(self.editor.save_edit(&session).await.map(Outcome::Subtask));
                        self.refresh_detail(session.task_id()).await;
                        outcome
                    }
                    None => Outcome::Ui,
                }
            }
            Intent::CancelSubtaskEdit => {
                self.ui().session = None;
                Outcome::Ui
            }
            Intent::Search { query } => {
                self.ui().query = query;
                Outcome::Ui
            }
        };
        Ok(outcome)
    }

    /// Reloads the detail overlay if it shows `id`; closes it if the task
    /// is gone. Does nothing if the overlay was closed or shows another task.
    async fn refresh_detail(&self, id: &TaskId) {
        if !self.shows(id) {
            return;
        }
        let task = self.repo.task(id).await;

        let mut ui = self.ui();
        // Closed or switched while the task was read.
        if ui.detail.as_ref().is_none_or(|d| &d.id != id) {
            return;
        }
        match task {
            Some(task) => {
                if let Some(detail) = &mut ui.detail {
                    detail.task = task;
                }
            }
            None => {
                debug!(task_id = %id, "task gone, closing detail");
                ui.detail = None;
            }
        }
    }

    fn shows(&self, id: &TaskId) -> bool {
        self.ui().detail.as_ref().is_some_and(|d| &d.id == id)
    }

    fn ui(&self) -> MutexGuard<'_, UiState> {
        self.ui.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn absorb(result: Result<Outcome>) -> Outcome {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "board operation failed");
        Outcome::Failed(e.to_string())
    })
}

fn intent_name(intent: &Intent) -> &'static str {
    match intent {
        Intent::Load => "load",
        Intent::Repair => "repair",
        Intent::CreateTask { .. } => "create_task",
        Intent::UpdateTask { .. } => "update_task",
        Intent::DeleteTask { .. } => "delete_task",
        Intent::MoveTo { .. } => "move_to",
        Intent::DragStart { .. } => "drag_start",
        Intent::DragCancel => "drag_cancel",
        Intent::Drop { .. } => "drop",
        Intent::OpenTask { .. } => "open_task",
        Intent::CloseTask => "close_task",
        Intent::AddSubtask { .. } => "add_subtask",
        Intent::EditSubtask { .. } => "edit_subtask",
        Intent::ToggleSubtask { .. } => "toggle_subtask",
        Intent::RemoveSubtask { .. } => "remove_subtask",
        Intent::BeginSubtaskEdit { .. } => "begin_subtask_edit",
        Intent::UpdateSubtaskDraft { .. } => "update_subtask_draft",
        Intent::SaveSubtaskEdit => "save_subtask_edit",
        Intent::CancelSubtaskEdit => "cancel_subtask_edit",
        Intent::Search { .. } => "search",
    }
}
