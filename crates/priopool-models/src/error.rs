//! Payload error type.

use thiserror::Error;

/// Failure reported by a task payload.
///
/// Payloads return this from their closure; the worker also builds one
/// when a payload panics. It never reaches the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PayloadError {
    message: String,
}

impl PayloadError {
    /// Creates a payload error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Builds an error from a panic payload caught at the worker boundary.
    pub fn from_panic(panic: &(dyn std::any::Any + Send)) -> Self {
        let detail = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self::new(format!("payload panicked: {}", detail))
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for PayloadError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for PayloadError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}
