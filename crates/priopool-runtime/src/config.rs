//! Worker pool configuration.
//!
//! # Environment Variables
//!
//! - `PRIOPOOL_WORKERS`: Number of worker threads
//! - `PRIOPOOL_POLL_INTERVAL_MS`: Dequeue/pause wait in milliseconds
//! - `PRIOPOOL_HISTORY_CAPACITY`: Retained history records (`0` = unbounded)

use std::time::Duration;

use crate::error::{PoolError, Result};

/// Environment variable for the worker count.
pub const WORKERS_ENV: &str = "PRIOPOOL_WORKERS";

/// Environment variable for the poll interval in milliseconds.
pub const POLL_INTERVAL_ENV: &str = "PRIOPOOL_POLL_INTERVAL_MS";

/// Environment variable for the history capacity.
pub const HISTORY_CAPACITY_ENV: &str = "PRIOPOOL_HISTORY_CAPACITY";

const DEFAULT_WORKERS: usize = 6;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);
const DEFAULT_HISTORY_CAPACITY: usize = 1000;
const DEFAULT_THREAD_NAME: &str = "priopool-worker";

/// Configuration for the worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads (must be at least 1).
    pub workers: usize,
    /// How long a worker waits for a task (or for resume) before re-checking.
    pub poll_interval: Duration,
    /// Number of history records retained, oldest evicted first.
    /// `None` keeps every record.
    pub history_capacity: Option<usize>,
    /// Prefix for worker thread names.
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            history_capacity: Some(DEFAULT_HISTORY_CAPACITY),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl PoolConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config from defaults overridden by `PRIOPOOL_*` variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a config from defaults overridden by the given lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(WORKERS_ENV) {
            config.workers = parse_number(WORKERS_ENV, &raw)?;
        }

        if let Some(raw) = lookup(POLL_INTERVAL_ENV) {
            config.poll_interval = Duration::from_millis(parse_number(POLL_INTERVAL_ENV, &raw)?);
        }

        if let Some(raw) = lookup(HISTORY_CAPACITY_ENV) {
            let capacity: usize = parse_number(HISTORY_CAPACITY_ENV, &raw)?;
            config.history_capacity = (capacity > 0).then_some(capacity);
        }

        Ok(config)
    }

    /// Sets the number of worker threads.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the history capacity (`None` for unbounded).
    pub fn with_history_capacity(mut self, capacity: Option<usize>) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Sets the worker thread name prefix.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Checks that the configuration can start a pool.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PoolError::InvalidConfiguration(
                "worker count must be at least 1".to_string(),
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(PoolError::InvalidConfiguration(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        if self.history_capacity == Some(0) {
            return Err(PoolError::InvalidConfiguration(
                "history capacity must be greater than zero (use None for unbounded)".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        PoolError::InvalidConfiguration(format!("{} must be a non-negative integer, got {:?}", key, raw))
    })
}
