//! Core data models for priopool.
//!
//! This crate provides the data types shared by the queue, the worker pool
//! and any observer that polls pool telemetry: priorities, task identifiers,
//! read-only task views, history records and statistics snapshots.

pub mod error;
pub mod history;
pub mod ids;
pub mod priority;
pub mod stats;
pub mod task;

// Re-export main types
pub use error::PayloadError;
pub use history::{round_duration, HistoryRecord, TaskOutcome};
pub use ids::TaskId;
pub use priority::{ParsePriorityError, Priority};
pub use stats::PoolStats;
pub use task::{RunningTask, TaskInfo};
