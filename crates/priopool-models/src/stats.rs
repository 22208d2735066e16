//! Pool statistics snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Point-in-time counters of a worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolStats {
    /// Number of worker threads.
    pub workers: usize,
    /// Tasks waiting in the queue.
    pub queued: usize,
    /// Tasks currently executing.
    pub active: usize,
    /// Tasks finished, successful or not.
    pub completed: u64,
    /// Finished tasks whose payload failed (subset of `completed`).
    pub failed: u64,
    /// Tasks removed from the queue without running.
    pub discarded: u64,
    /// Tasks ever accepted by the pool.
    pub submitted: u64,
    /// Whether dequeuing is suspended.
    pub paused: bool,
    /// Whether shutdown has begun.
    pub stopping: bool,
}

impl PoolStats {
    /// Number of tasks accounted for by queue, workers and counters.
    pub fn accounted(&self) -> u64 {
        self.queued as u64 + self.active as u64 + self.completed + self.discarded
    }

    /// Returns true if every submitted task is accounted for.
    pub fn is_conserved(&self) -> bool {
        self.accounted() == self.submitted
    }

    /// Returns true if nothing is queued or executing.
    pub fn is_idle(&self) -> bool {
        self.queued == 0 && self.active == 0
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.stopping {
            "stopping"
        } else if self.paused {
            "paused"
        } else {
            "running"
        };
        write!(
            f,
            "[{}] active {}/{} | queued {} | completed {} (failed {}) | discarded {}",
            state,
            self.active,
            self.workers,
            self.queued,
            self.completed,
            self.failed,
            self.discarded
        )
    }
}
