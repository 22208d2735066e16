//! Tasks and their payloads.

use std::fmt;

use chrono::Utc;
use priopool_models::{PayloadError, Priority, TaskId, TaskInfo};
use serde_json::Value;

/// Result returned by a payload.
pub type PayloadResult = std::result::Result<(), PayloadError>;

type PayloadFn = dyn FnOnce(&[Value]) -> PayloadResult + Send + 'static;

/// A named unit of work.
///
/// The closure receives the task's arguments and runs at most once, on
/// whichever worker dequeues the task.
pub struct Payload {
    name: String,
    func: Box<PayloadFn>,
}

impl Payload {
    /// Creates a payload that receives the task arguments and may fail.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: FnOnce(&[Value]) -> PayloadResult + Send + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }

    /// Creates an infallible payload that ignores its arguments.
    pub fn from_fn<F>(name: impl Into<String>, func: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::new(name, move |_args: &[Value]| {
            func();
            Ok(())
        })
    }

    /// Returns the payload's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the payload with the given arguments.
    pub fn invoke(self, args: &[Value]) -> PayloadResult {
        (self.func)(args)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload").field("name", &self.name).finish()
    }
}

/// A submitted task: priority, payload and arguments.
///
/// Immutable once enqueued, apart from the arrival sequence the queue
/// stamps on it.
#[derive(Debug)]
pub struct Task {
    info: TaskInfo,
    payload: Payload,
}

impl Task {
    /// Creates a new task with a fresh ID.
    pub fn new(priority: Priority, payload: Payload, args: Vec<Value>) -> Self {
        let info = TaskInfo {
            id: TaskId::new(),
            name: payload.name().to_string(),
            priority,
            args,
            sequence: 0,
            submitted_at: Utc::now(),
        };
        Self { info, payload }
    }

    /// Returns the task's ID.
    pub fn id(&self) -> &TaskId {
        &self.info.id
    }

    /// Returns the task's priority.
    pub fn priority(&self) -> Priority {
        self.info.priority
    }

    /// Returns the arrival sequence assigned by the queue.
    pub fn sequence(&self) -> u64 {
        self.info.sequence
    }

    /// Returns the task's arguments.
    pub fn args(&self) -> &[Value] {
        &self.info.args
    }

    /// Returns the display view of the task.
    pub fn info(&self) -> &TaskInfo {
        &self.info
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.info.sequence = sequence;
    }

    /// Splits the task into its view and payload.
    pub fn into_parts(self) -> (TaskInfo, Payload) {
        (self.info, self.payload)
    }

    /// Runs the payload with the task's arguments.
    pub fn execute(self) -> PayloadResult {
        let (info, payload) = self.into_parts();
        payload.invoke(&info.args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_payload_receives_args() {
        let payload = Payload::new("sum", |args: &[Value]| {
            let total: i64 = args.iter().filter_map(Value::as_i64).sum();
            if total == 6 {
                Ok(())
            } else {
                Err(PayloadError::new(format!("bad total {}", total)))
            }
        });
        let task = Task::new(Priority::Low, payload, vec![json!(1), json!(2), json!(3)]);

        assert!(task.execute().is_ok());
    }

    #[test]
    fn test_payload_error_is_returned() {
        let payload = Payload::new("fail", |_: &[Value]| Err("nope".into()));
        let task = Task::new(Priority::High, payload, Vec::new());

        let err = task.execute().unwrap_err();
        assert_eq!(err.message(), "nope");
    }

    #[test]
    fn test_from_fn_runs_once() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let payload = Payload::from_fn("flag", move || flag.store(true, Ordering::SeqCst));

        let task = Task::new(Priority::Medium, payload, vec![json!("x")]);
        assert_eq!(task.info().name, "flag");
        assert_eq!(task.args(), &[json!("x")]);

        task.execute().unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_debug_hides_closure() {
        let payload = Payload::from_fn("quiet", || {});
        assert_eq!(format!("{:?}", payload), "Payload { name: \"quiet\" }");
    }
}
