//! Shared protocol types for the join board.
//!
//! This crate defines the task record as it is stored in the remote
//! database, the board read model renderers consume, the intents UI code
//! emits, and the error types for decoding and validation.
//!
//! # Overview
//!
//! - [`task`]: Task identifiers, subtasks, and the `Task` record
//! - [`board`]: The four board columns and the `BoardView` read model
//! - [`wire`]: Decoding of the raw task collection
//! - [`intent`]: What the user asked the board to do
//! - [`progress`] and [`summary`]: Derived figures
//! - [`contacts`]: Assignee lookups
//! - [`error`]: Error types for protocol operations
//!
//! # Examples
//!
//! ```
//! use join_protocol::{BoardView, MainCategory, NoContacts, Task, TaskCategory, TaskId, TaskMap};
//!
//! let mut tasks = TaskMap::new();
//! tasks.insert(TaskId::new("-Na"), Task::new("Write docs", TaskCategory::TechnicalTask));
//!
//! let view = BoardView::build(&tasks, "", &NoContacts);
//! assert_eq!(view.column(MainCategory::ToDo).cards.len(), 1);
//! ```

pub mod board;
pub mod contacts;
pub mod dummy;
pub mod error;
pub mod intent;
pub mod progress;
pub mod summary;
pub mod task;
pub mod wire;

pub use board::{BoardView, Card, Column, MainCategory, TaskMap};
pub use contacts::{Assignee, ContactDirectory, NoContacts};
pub use error::{ProtocolError, Result};
pub use intent::Intent;
pub use progress::Progress;
pub use summary::{BoardSummary, UrgentSummary};
pub use task::{Priority, Subtask, SubtaskId, SubtaskKey, Task, TaskCategory, TaskId, TaskPatch};
pub use wire::{DecodedCollection, decode_collection};
