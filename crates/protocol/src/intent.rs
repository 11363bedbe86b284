//! Board intents.
//!
//! UI code never calls the repository directly; it emits an [`Intent`] and
//! the board dispatcher turns it into repository, editor, or drag/drop
//! operations. This keeps the core independent of any rendering technology.

use serde::{Deserialize, Serialize};

use crate::board::MainCategory;
use crate::task::{SubtaskKey, Task, TaskId, TaskPatch};

/// Something the user asked the board to do.
///
/// # Examples
///
/// ```
/// use join_protocol::{Intent, MainCategory, TaskId};
///
/// let intent = Intent::MoveTo { id: TaskId::new("-Na"), category: MainCategory::Done };
/// assert!(intent.touches_store());
/// assert_eq!(intent.task_id().map(TaskId::as_str), Some("-Na"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    /// Reload the whole task collection.
    Load,
    /// Give legacy tasks a column and their subtasks stable ids.
    Repair,
    /// Create a task from the add-task form.
    CreateTask {
        /// The task to create.
        task: Task,
    },
    /// Save fields edited in the task form.
    UpdateTask {
        /// The edited task.
        id: TaskId,
        /// The edited fields.
        patch: TaskPatch,
    },
    /// Delete a task.
    DeleteTask {
        /// The task to delete.
        id: TaskId,
    },
    /// Move a task with the category-switch control.
    MoveTo {
        /// The task to move.
        id: TaskId,
        /// The target column.
        category: MainCategory,
    },
    /// A card started being dragged.
    DragStart {
        /// The dragged task.
        id: TaskId,
    },
    /// The drag ended without a drop.
    DragCancel,
    /// The dragged card was dropped on a zone.
    Drop {
        /// Name of the zone under the pointer.
        zone: String,
    },
    /// Open the detail overlay of a task.
    OpenTask {
        /// The task to show.
        id: TaskId,
    },
    /// Close the detail overlay.
    CloseTask,
    /// Append a subtask.
    AddSubtask {
        /// The parent task.
        id: TaskId,
        /// Untrimmed input text.
        text: String,
    },
    /// Replace the text of a subtask.
    EditSubtask {
        /// The parent task.
        id: TaskId,
        /// The subtask to change.
        key: SubtaskKey,
        /// Untrimmed input text.
        text: String,
    },
    /// Check or uncheck a subtask.
    ToggleSubtask {
        /// The parent task.
        id: TaskId,
        /// The subtask to flip.
        key: SubtaskKey,
    },
    /// Delete a subtask.
    RemoveSubtask {
        /// The parent task.
        id: TaskId,
        /// The subtask to delete.
        key: SubtaskKey,
    },
    /// Enter inline edit mode for a subtask.
    BeginSubtaskEdit {
        /// The parent task.
        id: TaskId,
        /// The subtask to edit.
        key: SubtaskKey,
    },
    /// Type into the inline editor.
    UpdateSubtaskDraft {
        /// The full draft text.
        text: String,
    },
    /// Leave inline edit mode and save the draft.
    SaveSubtaskEdit,
    /// Leave inline edit mode and discard the draft.
    CancelSubtaskEdit,
    /// Filter the board by title or description.
    Search {
        /// The search text; empty clears the filter.
        query: String,
    },
}

impl Intent {
    /// Returns `true` if handling this intent may issue requests to the
    /// remote store.
    ///
    /// # Examples
    ///
    /// ```
    /// use join_protocol::Intent;
    ///
    /// assert!(Intent::Load.touches_store());
    /// assert!(Intent::SaveSubtaskEdit.touches_store());
    /// assert!(!Intent::CancelSubtaskEdit.touches_store());
    /// assert!(!Intent::Search { query: "x".into() }.touches_store());
    /// ```
    #[must_use]
    pub fn touches_store(&self) -> bool {
        !matches!(
            self,
            Self::DragStart { .. }
                | Self::DragCancel
                | Self::OpenTask { .. }
                | Self::CloseTask
                | Self::BeginSubtaskEdit { .. }
                | Self::UpdateSubtaskDraft { .. }
                | Self::CancelSubtaskEdit
                | Self::Search { .. }
        )
    }

    /// Returns the task the intent names explicitly, if any.
    #[must_use]
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::UpdateTask { id, .. }
            | Self::DeleteTask { id }
            | Self::MoveTo { id, .. }
            | Self::DragStart { id }
            | Self::OpenTask { id }
            | Self::AddSubtask { id, .. }
            | Self::EditSubtask { id, .. }
            | Self::ToggleSubtask { id, .. }
            | Self::RemoveSubtask { id, .. }
            | Self::BeginSubtaskEdit { id, .. } => Some(id),
            _ => None,
        }
    }
}
