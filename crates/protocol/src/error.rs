//! Error types for the join-protocol crate.
//!
//! This module defines all error types that can occur when working with
//! protocol types, including decoding stored records and validating input.

use thiserror::Error;

/// Errors that can occur during protocol operations.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Failed to serialize a protocol type to JSON.
    #[error("failed to serialize to JSON: {0}")]
    SerializationFailed(#[source] serde_json::Error),

    /// A stored task record could not be decoded.
    #[error("invalid task record {id}: {source}")]
    InvalidRecord {
        /// The store key of the rejected record.
        id: String,
        /// The underlying decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// The task collection was neither `null` nor an object.
    #[error("task collection must be an object, got {0}")]
    InvalidCollection(&'static str),

    /// A task title was empty or invalid.
    #[error("invalid task title: title cannot be empty")]
    InvalidTaskTitle,

    /// A subtask text was empty after trimming.
    #[error("invalid subtask: text cannot be empty")]
    EmptySubtaskText,

    /// A priority string did not name a known priority.
    #[error("unknown priority: {0:?}")]
    UnknownPriority(String),

    /// A column name did not name one of the four board columns.
    #[error("unknown board column: {0:?}")]
    UnknownMainCategory(String),
}

/// A specialized Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
