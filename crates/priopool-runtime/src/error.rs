//! Error types for the worker pool.

use priopool_queue::QueueError;
use thiserror::Error;

/// Errors that can occur in the worker pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Configuration rejected at construction.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Task submitted after shutdown began.
    #[error("worker pool is shut down")]
    ShutDown,

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker: {0}")]
    Spawn(String),

    /// Shutdown was requested from one of the pool's own tasks.
    #[error("shutdown cannot be called from a worker of the same pool")]
    ShutdownFromWorker,

    /// A worker thread panicked outside a payload.
    #[error("worker panicked: {0}")]
    WorkerPanicked(String),
}

impl From<QueueError> for PoolError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Closed => PoolError::ShutDown,
        }
    }
}

/// Result type for worker pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;
