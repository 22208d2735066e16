//! Thread-safe priority task queue for priopool.
//!
//! This crate provides the `TaskQueue` shared by producers and workers:
//! - `Mutex` + `Condvar` guarded `BinaryHeap` of pending tasks
//! - Ordering by (priority, arrival sequence), FIFO within a priority
//! - Bounded-timeout dequeue that doubles as the pause wait
//! - Close/drain operations used by graceful shutdown and "clear queue"
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use priopool_models::Priority;
//! use priopool_queue::{Payload, Task, TaskQueue};
//!
//! let queue = TaskQueue::new();
//! let payload = Payload::from_fn("noop", || {});
//! queue.enqueue(Task::new(Priority::High, payload, vec!["a".into()])).unwrap();
//!
//! if let Some(task) = queue.dequeue(Duration::from_millis(10)) {
//!     assert_eq!(task.info().display_value(), "a");
//!     task.execute().unwrap();
//! }
//! ```

pub mod error;
pub mod queue;
pub mod task;

pub use error::{QueueError, Result};
pub use queue::{QueueCounts, TaskQueue};
pub use task::{Payload, PayloadResult, Task};
