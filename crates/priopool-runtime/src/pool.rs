//! Worker pool handle.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use priopool_models::{HistoryRecord, PoolStats, Priority, RunningTask, TaskId, TaskInfo};
use priopool_queue::{Payload, Task};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::state::Shared;
use crate::worker::{self, Worker};

/// A fixed set of worker threads executing tasks in priority order.
///
/// Producers call [`submit`](Self::submit) from any thread; observers poll
/// the read accessors, which only take short locks and never wait on a
/// running payload. [`shutdown`](Self::shutdown) stops accepting work,
/// drains the queue and joins every worker.
///
/// Dropping a pool without calling `shutdown` closes its queue; the
/// detached workers finish the remaining tasks and exit on their own.
pub struct WorkerPool {
    shared: Arc<Shared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Creates a pool and spawns its workers immediately.
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let workers = config.workers;
        let shared = Arc::new(Shared::new(config));
        let mut handles = Vec::with_capacity(workers);

        for index in 0..workers {
            match Worker::spawn(index, Arc::clone(&shared)) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    shared.queue.close();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(PoolError::Spawn(e.to_string()));
                }
            }
        }

        info!(
            workers,
            poll_interval_ms = shared.config.poll_interval.as_millis() as u64,
            "worker pool started"
        );

        Ok(Self {
            shared,
            handles: Mutex::new(handles),
        })
    }

    /// Creates a pool with `workers` threads and otherwise default settings.
    pub fn with_workers(workers: usize) -> Result<Self> {
        Self::new(PoolConfig::new().with_workers(workers))
    }

    /// Returns the pool configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Returns the number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.shared.config.workers
    }

    /// Submits a payload with its arguments.
    ///
    /// # Returns
    ///
    /// The ID of the queued task, or `PoolError::ShutDown` once shutdown
    /// has begun.
    pub fn submit(&self, priority: Priority, payload: Payload, args: Vec<Value>) -> Result<TaskId> {
        self.submit_task(Task::new(priority, payload, args))
    }

    /// Submits an already-built task.
    pub fn submit_task(&self, task: Task) -> Result<TaskId> {
        let priority = task.priority();
        let id = self.shared.queue.enqueue(task)?;
        debug!(task_id = %id, priority = %priority, "task submitted");
        Ok(id)
    }

    /// Stops workers from taking new tasks. Running tasks continue.
    ///
    /// Has no effect once shutdown has begun.
    pub fn pause(&self) {
        self.shared.queue.pause();
        info!("worker pool paused");
    }

    /// Lets workers take tasks again.
    pub fn resume(&self) {
        self.shared.queue.resume();
        info!("worker pool resumed");
    }

    /// Returns true if the pool is paused.
    pub fn is_paused(&self) -> bool {
        self.shared.queue.is_paused()
    }

    /// Discards every pending task.
    ///
    /// # Returns
    ///
    /// The number of tasks removed. Running tasks are unaffected.
    pub fn clear_queue(&self) -> usize {
        let count = self.shared.queue.drain_all();
        info!(count, "cleared pending tasks");
        count
    }

    /// Drains the queue and stops every worker.
    ///
    /// Blocks until all queued and in-flight tasks have finished and every
    /// worker thread has exited. Closing the queue lifts any pause, so a
    /// paused pool still drains.
    /// Safe to call more than once; later calls return once the pool has
    /// stopped.
    ///
    /// A task must not shut down its own pool: the call would wait for the
    /// worker running it, so it returns `PoolError::ShutdownFromWorker`.
    pub fn shutdown(&self) -> Result<()> {
        if worker::is_worker_of(&self.shared) {
            return Err(PoolError::ShutdownFromWorker);
        }

        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);

        if self.shared.state().stopped {
            return Ok(());
        }

        info!(
            pending = self.shared.queue.size(),
            "graceful shutdown initiated"
        );

        self.shared.state().stopping = true;
        self.shared.queue.close();

        let mut panicked = Vec::new();
        for (index, handle) in handles.drain(..).enumerate() {
            let name = handle
                .thread()
                .name()
                .map(String::from)
                .unwrap_or_else(|| format!("worker-{}", index));
            if handle.join().is_err() {
                warn!(worker = %name, "worker thread panicked");
                panicked.push(name);
            }
        }

        self.shared.state().stopped = true;
        info!(
            completed = self.completed_tasks(),
            "all queued tasks completed, worker pool stopped"
        );

        if panicked.is_empty() {
            Ok(())
        } else {
            Err(PoolError::WorkerPanicked(panicked.join(", ")))
        }
    }

    /// Returns true once shutdown has begun.
    pub fn is_stopping(&self) -> bool {
        self.shared.state().stopping
    }

    /// Returns true once shutdown has finished joining every worker.
    pub fn is_shut_down(&self) -> bool {
        self.shared.state().stopped
    }

    /// Returns the number of pending tasks.
    pub fn queue_size(&self) -> usize {
        self.shared.queue.size()
    }

    /// Returns the number of tasks currently executing.
    pub fn active_tasks(&self) -> usize {
        self.shared.state().active
    }

    /// Returns the number of finished tasks, including failed ones.
    pub fn completed_tasks(&self) -> u64 {
        self.shared.state().completed
    }

    /// Returns the number of finished tasks whose payload failed.
    pub fn failed_tasks(&self) -> u64 {
        self.shared.state().failed
    }

    /// Returns the task each busy worker is executing, ordered by worker.
    pub fn current_task(&self) -> Vec<RunningTask> {
        self.shared.state().running.values().cloned().collect()
    }

    /// Returns the pending tasks in the order they will be offered.
    pub fn get_queue_items(&self) -> Vec<TaskInfo> {
        self.shared.queue.snapshot()
    }

    /// Returns every retained history record, oldest first.
    pub fn task_history(&self) -> Vec<HistoryRecord> {
        self.shared.state().history.iter().cloned().collect()
    }

    /// Returns the last `n` history records, oldest first.
    pub fn recent_history(&self, n: usize) -> Vec<HistoryRecord> {
        self.shared.state().recent_history(n)
    }

    /// Returns a consistent snapshot of all counters.
    ///
    /// Queue and pool state are read under both locks, so `submitted`
    /// always equals `queued + active + completed + discarded`.
    pub fn stats(&self) -> PoolStats {
        let workers = self.worker_count();
        self.shared.queue.inspect(|counts| {
            let state = self.shared.state();
            PoolStats {
                workers,
                queued: counts.pending,
                active: state.active,
                completed: state.completed,
                failed: state.failed,
                discarded: counts.discarded,
                submitted: counts.submitted,
                paused: counts.paused,
                stopping: state.stopping,
            }
        })
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Let detached workers drain and exit if shutdown was never called
        if !self.shared.state().stopped {
            self.shared.state().stopping = true;
            self.shared.queue.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn test_config(workers: usize) -> PoolConfig {
        PoolConfig::new()
            .with_workers(workers)
            .with_poll_interval(Duration::from_millis(20))
    }

    #[test]
    fn test_new_rejects_zero_workers() {
        let result = WorkerPool::with_workers(0);
        assert!(matches!(result, Err(PoolError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_new_pool_is_idle() {
        let pool = WorkerPool::new(test_config(3)).unwrap();

        assert_eq!(pool.worker_count(), 3);
        assert_eq!(pool.queue_size(), 0);
        assert_eq!(pool.active_tasks(), 0);
        assert_eq!(pool.completed_tasks(), 0);
        assert!(pool.current_task().is_empty());
        assert!(!pool.is_paused());
        assert!(!pool.is_stopping());

        pool.shutdown().unwrap();
        assert!(pool.is_shut_down());
    }

    #[test]
    fn test_submit_after_shutdown_rejected() {
        let pool = WorkerPool::new(test_config(1)).unwrap();
        pool.shutdown().unwrap();

        let result = pool.submit(Priority::High, Payload::from_fn("late", || {}), Vec::new());
        assert!(matches!(result, Err(PoolError::ShutDown)));
    }

    #[test]
    fn test_shutdown_twice() {
        let pool = WorkerPool::new(test_config(2)).unwrap();

        pool.shutdown().unwrap();
        pool.shutdown().unwrap();
        assert!(pool.is_shut_down());
    }

    #[test]
    fn test_shutdown_from_own_task_rejected() {
        let pool = Arc::new(WorkerPool::new(test_config(1)).unwrap());
        let (tx, rx) = mpsc::channel();

        let inner = Arc::clone(&pool);
        pool.submit(
            Priority::High,
            Payload::from_fn("nested-shutdown", move || {
                let _ = tx.send(inner.shutdown());
            }),
            Vec::new(),
        )
        .unwrap();

        let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(result, Err(PoolError::ShutdownFromWorker)));
        assert!(!pool.is_stopping());

        pool.shutdown().unwrap();
        assert_eq!(pool.completed_tasks(), 1);
    }

    #[test]
    fn test_shutdown_other_pool_from_task() {
        let outer = WorkerPool::new(test_config(1)).unwrap();
        let inner = Arc::new(WorkerPool::new(test_config(1)).unwrap());
        let (tx, rx) = mpsc::channel();

        let target = Arc::clone(&inner);
        outer
            .submit(
                Priority::Medium,
                Payload::from_fn("stop-other", move || {
                    let _ = tx.send(target.shutdown().is_ok());
                }),
                Vec::new(),
            )
            .unwrap();

        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
        assert!(inner.is_shut_down());
        outer.shutdown().unwrap();
    }

    #[test]
    fn test_stats_track_pause_and_stop() {
        let pool = WorkerPool::new(test_config(1)).unwrap();

        pool.pause();
        let stats = pool.stats();
        assert!(stats.paused);
        assert!(!stats.stopping);
        assert_eq!(stats.workers, 1);

        pool.shutdown().unwrap();
        let stats = pool.stats();
        assert!(!stats.paused);
        assert!(stats.stopping);
    }
}
