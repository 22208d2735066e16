//! Read-only task views handed to observers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::TaskId;
use crate::priority::Priority;

/// Display view of a submitted task.
///
/// This is a copy of the task's identity and arguments, detached from the
/// payload, so observers can hold it while workers keep mutating the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    /// Unique identifier of the task.
    pub id: TaskId,

    /// Name of the payload (its display identity).
    pub name: String,

    /// Priority the task was submitted with.
    pub priority: Priority,

    /// Arguments passed to the payload.
    #[serde(default)]
    pub args: Vec<Value>,

    /// Arrival sequence number within the queue.
    pub sequence: u64,

    /// When the task was submitted.
    pub submitted_at: DateTime<Utc>,
}

impl TaskInfo {
    /// The task's first argument, or `null` if it has none.
    pub fn value(&self) -> &Value {
        self.args.first().unwrap_or(&Value::Null)
    }

    /// The first argument rendered for display (strings unquoted).
    pub fn display_value(&self) -> String {
        display_value(self.value())
    }
}

/// A task currently executing on a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningTask {
    /// Index of the worker running the task.
    pub worker: usize,

    /// The task being executed.
    pub task: TaskInfo,

    /// When the worker started the payload.
    pub started_at: DateTime<Utc>,
}

/// Renders a JSON value for display, without quoting strings.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(args: Vec<Value>) -> TaskInfo {
        TaskInfo {
            id: TaskId::from("t-1"),
            name: "work".to_string(),
            priority: Priority::High,
            args,
            sequence: 0,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_value_uses_first_arg() {
        let task = info(vec![json!("alpha"), json!(3)]);
        assert_eq!(task.value(), &json!("alpha"));
        assert_eq!(task.display_value(), "alpha");
    }

    #[test]
    fn test_value_without_args() {
        let task = info(Vec::new());
        assert_eq!(task.value(), &Value::Null);
        assert_eq!(task.display_value(), "-");
    }

    #[test]
    fn test_display_non_string() {
        let task = info(vec![json!(42)]);
        assert_eq!(task.display_value(), "42");
    }
}
