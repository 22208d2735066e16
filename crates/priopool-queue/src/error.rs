//! Error types for task queue operations.

use thiserror::Error;

/// Errors that can occur during task queue operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Queue has been closed and accepts no more tasks.
    #[error("queue is closed")]
    Closed,
}

/// Result type alias for task queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
