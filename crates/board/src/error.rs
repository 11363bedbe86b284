//! Error types for board operations.

use join_protocol::{ProtocolError, TaskId};
use join_store::StoreError;

/// Errors that can occur while mutating or synchronizing the board.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// The remote store request failed.
    #[error("store request failed: {0}")]
    Store(#[from] StoreError),

    /// The task is not in the local mapping.
    #[error("task {0} is not loaded")]
    TaskNotFound(TaskId),

    /// The task was re-fetched but no longer exists remotely.
    #[error("task {0} no longer exists in the store")]
    RemoteTaskMissing(TaskId),

    /// The store accepted a new task but did not say under which key.
    #[error("store did not return a key for the created task")]
    MissingCreatedKey,

    /// A task failed to encode, decode, or validate.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// A specialized Result type for board operations.
pub type Result<T> = std::result::Result<T, BoardError>;
