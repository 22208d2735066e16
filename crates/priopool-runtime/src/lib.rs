//! Priority worker pool for priopool.
//!
//! This crate provides the execution side of priopool:
//! - `WorkerPool` - spawns a fixed set of worker threads over a shared queue
//! - `PoolConfig` - worker count, poll interval and history retention
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use priopool_models::Priority;
//! use priopool_queue::Payload;
//! use priopool_runtime::{PoolConfig, WorkerPool};
//!
//! let config = PoolConfig::new()
//!     .with_workers(2)
//!     .with_poll_interval(Duration::from_millis(20));
//! let pool = WorkerPool::new(config).unwrap();
//!
//! let payload = Payload::from_fn("sleep", || std::thread::sleep(Duration::from_millis(10)));
//! pool.submit(Priority::High, payload, vec!["report".into()]).unwrap();
//!
//! // Drains the queue and joins the workers
//! pool.shutdown().unwrap();
//! assert_eq!(pool.completed_tasks(), 1);
//! assert_eq!(pool.task_history()[0].value, "report");
//! ```
//!
//! # Key Concepts
//!
//! ## Worker loop
//!
//! Each worker repeatedly:
//! - Exits once shutdown has begun and the queue is empty
//! - Waits (bounded by the poll interval) while the pool is paused
//! - Takes the next task by (priority, arrival order) and marks it in-flight
//!   in the same critical section
//! - Runs the payload, catching errors and panics
//! - Records the outcome in the counters and history
//!
//! ## Failures
//!
//! A failing payload never reaches the submitter and never stops its
//! worker. It is logged, counted in both `completed_tasks` and
//! `failed_tasks`, and its history record carries `outcome = failed`.

pub mod config;
pub mod error;
pub mod pool;
mod state;
mod worker;

pub use config::PoolConfig;
pub use error::{PoolError, Result};
pub use pool::WorkerPool;
