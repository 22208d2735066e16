//! Text and JSON rendering of pool telemetry.

use priopool_models::{HistoryRecord, PoolStats, RunningTask, TaskInfo};
use priopool_runtime::WorkerPool;
use serde::Serialize;

/// Number of history lines shown by default.
pub const HISTORY_LINES: usize = 50;

/// One telemetry sample, as emitted in JSON mode.
#[derive(Debug, Serialize)]
pub struct Telemetry {
    pub stats: PoolStats,
    pub running: Vec<RunningTask>,
    pub queue: Vec<TaskInfo>,
}

impl Telemetry {
    /// Samples the pool.
    pub fn capture(pool: &WorkerPool) -> Self {
        Self {
            stats: pool.stats(),
            running: pool.current_task(),
            queue: pool.get_queue_items(),
        }
    }
}

/// Renders the "currently executing" line.
pub fn format_running(running: &[RunningTask]) -> String {
    if running.is_empty() {
        return "Currently executing: none".to_string();
    }

    let tasks: Vec<String> = running
        .iter()
        .map(|r| {
            format!(
                "#{} {} ({})",
                r.worker,
                r.task.display_value(),
                r.task.priority
            )
        })
        .collect();
    format!("Currently executing: {}", tasks.join(", "))
}

/// Renders pending tasks, one per line.
pub fn format_queue(items: &[TaskInfo]) -> Vec<String> {
    items
        .iter()
        .map(|item| format!("{} ({})", item.display_value(), item.priority))
        .collect()
}

/// Renders history records, one per line.
pub fn format_history(records: &[HistoryRecord]) -> Vec<String> {
    records.iter().map(HistoryRecord::summary).collect()
}

/// Renders a telemetry sample as a compact status block.
pub fn format_telemetry(sample: &Telemetry) -> String {
    let mut out = sample.stats.to_string();
    out.push('\n');
    out.push_str(&format_running(&sample.running));

    if !sample.queue.is_empty() {
        let preview: Vec<String> = format_queue(&sample.queue).into_iter().take(5).collect();
        out.push_str(&format!("\nNext up: {}", preview.join(", ")));
        if sample.queue.len() > preview.len() {
            out.push_str(&format!(" (+{} more)", sample.queue.len() - preview.len()));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use priopool_models::{Priority, TaskId};
    use serde_json::json;
    use std::time::Duration;

    fn info(value: &str, priority: Priority) -> TaskInfo {
        TaskInfo {
            id: TaskId::new(),
            name: "sim".to_string(),
            priority,
            args: vec![json!(value)],
            sequence: 0,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_running_none() {
        assert_eq!(format_running(&[]), "Currently executing: none");
    }

    #[test]
    fn test_format_running_tasks() {
        let running = vec![RunningTask {
            worker: 1,
            task: info("alpha", Priority::High),
            started_at: Utc::now(),
        }];
        assert_eq!(format_running(&running), "Currently executing: #1 alpha (HIGH)");
    }

    #[test]
    fn test_format_queue_and_history() {
        let items = vec![info("a", Priority::Low), info("b", Priority::Medium)];
        assert_eq!(format_queue(&items), vec!["a (LOW)", "b (MEDIUM)"]);

        let record = HistoryRecord::new(&items[0], 0, Duration::from_millis(250), None);
        assert_eq!(format_history(&[record]), vec!["a - LOW - 0.25s"]);
    }

    #[test]
    fn test_format_telemetry_truncates_queue() {
        let queue: Vec<TaskInfo> = (0..7)
            .map(|i| info(&format!("q{}", i), Priority::Medium))
            .collect();
        let sample = Telemetry {
            stats: PoolStats {
                workers: 1,
                queued: 7,
                submitted: 7,
                ..Default::default()
            },
            running: Vec::new(),
            queue,
        };

        let text = format_telemetry(&sample);
        assert!(text.contains("Next up: q0 (MEDIUM)"));
        assert!(text.ends_with("(+2 more)"));
    }

    #[test]
    fn test_telemetry_serializes() {
        let sample = Telemetry {
            stats: PoolStats::default(),
            running: Vec::new(),
            queue: vec![info("a", Priority::High)],
        };
        let value = serde_json::to_value(&sample).unwrap();
        assert_eq!(value["queue"][0]["priority"], "high");
        assert_eq!(value["stats"]["completed"], 0);
    }
}
