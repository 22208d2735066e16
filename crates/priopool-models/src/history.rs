//! Completed-task history records.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::TaskId;
use crate::priority::Priority;
use crate::task::{display_value, TaskInfo};

/// How a task's payload finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    /// Payload returned successfully.
    #[default]
    Completed,
    /// Payload returned an error or panicked.
    Failed,
}

/// One entry in the pool's task history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// ID of the finished task.
    pub task_id: TaskId,

    /// Payload name.
    pub name: String,

    /// First argument of the task (`null` when it had none).
    pub value: Value,

    /// Priority the task ran at.
    pub priority: Priority,

    /// Wall-clock execution time in seconds, rounded to two decimals.
    pub duration: f64,

    /// Whether the payload succeeded.
    pub outcome: TaskOutcome,

    /// Error message for failed payloads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Worker that executed the task.
    pub worker: usize,

    /// When the task finished.
    pub finished_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Builds a history record for a task that ran for `elapsed`.
    pub fn new(
        task: &TaskInfo,
        worker: usize,
        elapsed: Duration,
        failure: Option<String>,
    ) -> Self {
        let outcome = if failure.is_some() {
            TaskOutcome::Failed
        } else {
            TaskOutcome::Completed
        };

        Self {
            task_id: task.id.clone(),
            name: task.name.clone(),
            value: task.value().clone(),
            priority: task.priority,
            duration: round_duration(elapsed),
            outcome,
            error: failure,
            worker,
            finished_at: Utc::now(),
        }
    }

    /// Returns true if the payload failed.
    pub fn is_failure(&self) -> bool {
        self.outcome == TaskOutcome::Failed
    }

    /// One-line summary in the form `value - PRIORITY - 1.23s`.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} - {} - {:.2}s",
            display_value(&self.value),
            self.priority,
            self.duration
        );
        if let Some(ref error) = self.error {
            line.push_str(&format!(" (failed: {})", error));
        }
        line
    }
}

/// Converts a duration to seconds rounded to two decimal places.
pub fn round_duration(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info() -> TaskInfo {
        TaskInfo {
            id: TaskId::from("t-9"),
            name: "sleep".to_string(),
            priority: Priority::Low,
            args: vec![json!("job-a")],
            sequence: 4,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_round_duration() {
        assert_eq!(round_duration(Duration::from_millis(1234)), 1.23);
        assert_eq!(round_duration(Duration::from_millis(1239)), 1.24);
        assert_eq!(round_duration(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_record_success() {
        let record = HistoryRecord::new(&info(), 2, Duration::from_millis(1500), None);

        assert_eq!(record.value, json!("job-a"));
        assert_eq!(record.priority, Priority::Low);
        assert_eq!(record.duration, 1.5);
        assert_eq!(record.outcome, TaskOutcome::Completed);
        assert_eq!(record.worker, 2);
        assert!(!record.is_failure());
        assert_eq!(record.summary(), "job-a - LOW - 1.50s");
    }

    #[test]
    fn test_record_failure() {
        let record = HistoryRecord::new(
            &info(),
            0,
            Duration::from_millis(10),
            Some("disk full".to_string()),
        );

        assert!(record.is_failure());
        assert_eq!(record.error.as_deref(), Some("disk full"));
        assert!(record.summary().ends_with("(failed: disk full)"));
    }

    #[test]
    fn test_serialize_skips_missing_error() {
        let record = HistoryRecord::new(&info(), 0, Duration::from_millis(10), None);
        let json = serde_json::to_value(&record).unwrap();

        assert!(json.get("error").is_none());
        assert_eq!(json["outcome"], "completed");
        assert_eq!(json["priority"], "low");
    }
}
