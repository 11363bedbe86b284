//! Board core for join.
//!
//! This crate keeps the in-memory task mapping in sync with the remote store
//! and implements everything the board page does to tasks.
//!
//! # Overview
//!
//! - [`TaskRepository`]: Sole owner of the task mapping; load, repair, and
//!   persistence
//! - [`SubtaskEditor`]: Append, edit, toggle, and remove subtasks
//! - [`DragDropController`]: Drag state machine and drop zones
//! - [`Board`]: Turns [`Intent`](join_protocol::Intent)s into the above and
//!   publishes the [`BoardView`](join_protocol::BoardView)
//!
//! Writes are last-write-wins. A failed write leaves the local change in
//! place; nothing is rolled back.

pub mod board;
pub mod dragdrop;
pub mod editor;
pub mod error;
pub mod repository;

pub use board::{Board, DetailOverlay, Outcome};
pub use dragdrop::{DragDropController, DragState, DropOutcome, DropZones};
pub use editor::{EditSession, SkipReason, SubtaskEditor, SubtaskHandle, SubtaskOutcome};
pub use error::{BoardError, Result};
pub use repository::{LoadReport, RepairReport, TaskRepository};
