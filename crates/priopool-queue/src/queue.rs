//! TaskQueue - thread-safe priority queue of pending tasks.
//!
//! Concurrency pattern:
//! - One `Mutex` guards the heap, the sequence counter and the pause/close flags
//! - One `Condvar` wakes waiting consumers on enqueue, resume and close
//! - Consumers wait with a bounded timeout, so "nothing available" is a
//!   plain `None` rather than an error

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use priopool_models::{TaskId, TaskInfo};
use tracing::{debug, trace};

use crate::error::{QueueError, Result};
use crate::task::Task;

/// Wrapper for Task that implements the heap ordering.
///
/// # Ordering Rules
///
/// 1. Lower priority value comes first (High > Medium > Low)
/// 2. For same priority, lower arrival sequence comes first (FIFO)
///
/// Both comparisons are inverted because BinaryHeap is a max-heap.
struct QueuedTask {
    task: Task,
}

impl QueuedTask {
    fn key(&self) -> (priopool_models::Priority, u64) {
        (self.task.priority(), self.task.sequence())
    }
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// Internal state of the task queue.
struct QueueState {
    /// Pending tasks.
    heap: BinaryHeap<QueuedTask>,
    /// Sequence number for the next enqueued task.
    next_sequence: u64,
    /// Tasks ever accepted.
    submitted: u64,
    /// Tasks removed by `drain_all`.
    discarded: u64,
    /// Dequeue is suspended while set.
    paused: bool,
    /// No more tasks are accepted once set.
    closed: bool,
}

impl QueueState {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_sequence: 0,
            submitted: 0,
            discarded: 0,
            paused: false,
            closed: false,
        }
    }
}

/// Counters read atomically under the queue lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueCounts {
    /// Tasks waiting in the queue.
    pub pending: usize,
    /// Tasks ever accepted.
    pub submitted: u64,
    /// Tasks removed without running.
    pub discarded: u64,
    /// Whether dequeue is suspended.
    pub paused: bool,
    /// Whether the queue is closed.
    pub closed: bool,
}

/// Thread-safe priority task queue.
///
/// # Concurrency Pattern: `Mutex` + `Condvar`
///
/// Every operation takes the same lock, so a task handed to one consumer
/// can never also be returned to another consumer or discarded by
/// `drain_all`. Consumers block in `dequeue` for at most the given timeout.
///
/// # Pause and Close
///
/// While paused, `dequeue` hands out nothing and waits on the condition
/// variable; `resume` wakes every waiter. The paused flag and the wait share
/// the queue mutex, so a resume can't slip between the check and the wait.
/// Once closed, `enqueue` is rejected, the queue can no longer be paused,
/// and `dequeue` on an empty queue returns immediately.
pub struct TaskQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl TaskQueue {
    /// Creates an empty, open, unpaused queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::new()),
            available: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a task to the queue.
    ///
    /// # Returns
    ///
    /// The TaskId of the enqueued task, or `QueueError::Closed` once the
    /// queue has been closed.
    pub fn enqueue(&self, mut task: Task) -> Result<TaskId> {
        let mut state = self.lock();
        if state.closed {
            return Err(QueueError::Closed);
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.submitted += 1;
        task.set_sequence(sequence);

        let id = task.id().clone();
        trace!(task_id = %id, priority = %task.priority(), sequence, "task enqueued");
        state.heap.push(QueuedTask { task });
        drop(state);

        self.available.notify_one();
        Ok(id)
    }

    /// Removes and returns the next task, waiting up to `timeout`.
    ///
    /// # Returns
    ///
    /// `None` if no task became available in time, the queue stayed paused,
    /// or the queue is closed and empty.
    pub fn dequeue(&self, timeout: Duration) -> Option<Task> {
        self.dequeue_with(timeout, |_| {})
    }

    /// Like `dequeue`, but runs `on_take` while the queue lock is still held.
    ///
    /// Callers use this to record the task as in-flight in the same critical
    /// section that removes it from the queue.
    pub fn dequeue_with<F>(&self, timeout: Duration, on_take: F) -> Option<Task>
    where
        F: FnOnce(&Task),
    {
        // A timeout too large to represent waits without a deadline
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.lock();

        loop {
            if !state.paused {
                if let Some(queued) = state.heap.pop() {
                    on_take(&queued.task);
                    return Some(queued.task);
                }
                if state.closed {
                    return None;
                }
            }

            state = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    self.available
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .available
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }

    /// Returns a view of the next task without removing it.
    pub fn peek(&self) -> Option<TaskInfo> {
        self.lock().heap.peek().map(|queued| queued.task.info().clone())
    }

    /// Returns the number of pending tasks.
    pub fn size(&self) -> usize {
        self.lock().heap.len()
    }

    /// Returns true if no tasks are pending.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns views of all pending tasks in dequeue order.
    ///
    /// The queue itself is not modified.
    pub fn snapshot(&self) -> Vec<TaskInfo> {
        let state = self.lock();
        let mut items: Vec<TaskInfo> = state
            .heap
            .iter()
            .map(|queued| queued.task.info().clone())
            .collect();
        drop(state);

        items.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.sequence.cmp(&b.sequence))
        });
        items
    }

    /// Removes and discards every pending task.
    ///
    /// # Returns
    ///
    /// The number of tasks removed.
    pub fn drain_all(&self) -> usize {
        let mut state = self.lock();
        let count = state.heap.len();
        state.heap.clear();
        state.discarded += count as u64;
        drop(state);

        debug!(count, "drained pending tasks");
        count
    }

    /// Suspends dequeuing. Ignored once the queue is closed.
    pub fn pause(&self) {
        let mut state = self.lock();
        if !state.closed {
            state.paused = true;
        }
    }

    /// Resumes dequeuing and wakes all waiting consumers.
    pub fn resume(&self) {
        self.lock().paused = false;
        self.available.notify_all();
    }

    /// Returns true if dequeuing is suspended.
    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    /// Stops accepting tasks, lifts any pause and wakes all waiting consumers.
    ///
    /// Tasks already queued can still be dequeued.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.paused = false;
        drop(state);
        self.available.notify_all();
    }

    /// Returns true if the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Returns true if the queue is closed and nothing is pending.
    pub fn is_drained(&self) -> bool {
        let state = self.lock();
        state.closed && state.heap.is_empty()
    }

    /// Returns the number of tasks ever accepted.
    pub fn submitted_total(&self) -> u64 {
        self.lock().submitted
    }

    /// Returns the number of tasks removed by `drain_all`.
    pub fn discarded_total(&self) -> u64 {
        self.lock().discarded
    }

    /// Reads the queue counters and runs `f` while the lock is held.
    ///
    /// Lets callers combine queue counters with other state consistently,
    /// as long as that state is only ever locked after the queue.
    pub fn inspect<R, F>(&self, f: F) -> R
    where
        F: FnOnce(QueueCounts) -> R,
    {
        let state = self.lock();
        f(QueueCounts {
            pending: state.heap.len(),
            submitted: state.submitted,
            discarded: state.discarded,
            paused: state.paused,
            closed: state.closed,
        })
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
