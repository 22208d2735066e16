//! Shared pool state.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use priopool_models::{HistoryRecord, RunningTask, TaskInfo};
use priopool_queue::TaskQueue;

use crate::config::PoolConfig;

/// Aggregate counters and in-flight bookkeeping, guarded by one lock.
#[derive(Debug)]
pub(crate) struct PoolState {
    /// Tasks currently executing.
    pub(crate) active: usize,
    /// Tasks finished, successful or not.
    pub(crate) completed: u64,
    /// Finished tasks whose payload failed.
    pub(crate) failed: u64,
    /// In-flight task per worker index.
    pub(crate) running: BTreeMap<usize, RunningTask>,
    /// Finished-task records, oldest first.
    pub(crate) history: VecDeque<HistoryRecord>,
    history_capacity: Option<usize>,
    /// Set once by shutdown, never cleared.
    pub(crate) stopping: bool,
    /// Set once every worker has been joined.
    pub(crate) stopped: bool,
}

impl PoolState {
    pub(crate) fn new(history_capacity: Option<usize>) -> Self {
        Self {
            active: 0,
            completed: 0,
            failed: 0,
            running: BTreeMap::new(),
            history: VecDeque::new(),
            history_capacity,
            stopping: false,
            stopped: false,
        }
    }

    /// Marks `task` as in-flight on `worker`.
    pub(crate) fn start(&mut self, worker: usize, task: TaskInfo) {
        self.active += 1;
        self.running.insert(
            worker,
            RunningTask {
                worker,
                task,
                started_at: Utc::now(),
            },
        );
    }

    /// Moves `worker`'s in-flight task into the history.
    pub(crate) fn finish(&mut self, worker: usize, record: HistoryRecord) {
        if self.running.remove(&worker).is_some() {
            self.active = self.active.saturating_sub(1);
        }
        self.completed += 1;
        if record.is_failure() {
            self.failed += 1;
        }

        self.history.push_back(record);
        if let Some(capacity) = self.history_capacity {
            while self.history.len() > capacity {
                self.history.pop_front();
            }
        }
    }

    /// Returns the last `n` history records, oldest first.
    pub(crate) fn recent_history(&self, n: usize) -> Vec<HistoryRecord> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).cloned().collect()
    }
}

/// State shared between the pool handle and its workers.
///
/// Lock order is always `queue` then `state`.
pub(crate) struct Shared {
    pub(crate) config: PoolConfig,
    pub(crate) queue: TaskQueue,
    state: Mutex<PoolState>,
}

impl Shared {
    pub(crate) fn new(config: PoolConfig) -> Self {
        let state = PoolState::new(config.history_capacity);
        Self {
            config,
            queue: TaskQueue::new(),
            state: Mutex::new(state),
        }
    }

    /// Locks the pool state, recovering it if a holder panicked.
    pub(crate) fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use priopool_models::{Priority, TaskId};
    use serde_json::json;
    use std::time::Duration;

    fn info(value: &str) -> TaskInfo {
        TaskInfo {
            id: TaskId::new(),
            name: "test".to_string(),
            priority: Priority::Medium,
            args: vec![json!(value)],
            sequence: 0,
            submitted_at: Utc::now(),
        }
    }

    fn record(task: &TaskInfo, worker: usize, failure: Option<&str>) -> HistoryRecord {
        HistoryRecord::new(
            task,
            worker,
            Duration::from_millis(5),
            failure.map(String::from),
        )
    }

    #[test]
    fn test_start_and_finish() {
        let mut state = PoolState::new(None);
        let task = info("a");

        state.start(1, task.clone());
        assert_eq!(state.active, 1);
        assert_eq!(state.running.get(&1).unwrap().task.id, task.id);

        state.finish(1, record(&task, 1, None));
        assert_eq!(state.active, 0);
        assert_eq!(state.completed, 1);
        assert_eq!(state.failed, 0);
        assert!(state.running.is_empty());
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn test_failure_counted_as_completed() {
        let mut state = PoolState::new(None);
        let task = info("bad");

        state.start(0, task.clone());
        state.finish(0, record(&task, 0, Some("boom")));

        assert_eq!(state.completed, 1);
        assert_eq!(state.failed, 1);
        assert!(state.history[0].is_failure());
    }

    #[test]
    fn test_history_capacity_evicts_oldest() {
        let mut state = PoolState::new(Some(3));

        for i in 0..5 {
            let task = info(&i.to_string());
            state.start(0, task.clone());
            state.finish(0, record(&task, 0, None));
        }

        let values: Vec<_> = state.history.iter().map(|r| r.value.clone()).collect();
        assert_eq!(values, vec![json!("2"), json!("3"), json!("4")]);
        assert_eq!(state.completed, 5);
    }

    #[test]
    fn test_recent_history() {
        let mut state = PoolState::new(None);

        for i in 0..4 {
            let task = info(&i.to_string());
            state.start(0, task.clone());
            state.finish(0, record(&task, 0, None));
        }

        let recent = state.recent_history(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].value, json!("2"));
        assert_eq!(recent[1].value, json!("3"));

        assert_eq!(state.recent_history(10).len(), 4);
    }

    #[test]
    fn test_running_keyed_by_worker() {
        let mut state = PoolState::new(None);

        state.start(2, info("x"));
        state.start(0, info("y"));

        let workers: Vec<usize> = state.running.keys().copied().collect();
        assert_eq!(workers, vec![0, 2]);
        assert_eq!(state.active, 2);
    }
}
