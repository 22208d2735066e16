//! Simulated workloads submitted by the demo and the REPL.

use std::thread;
use std::time::Duration;

use chrono::Utc;
use priopool_models::{PayloadError, Priority};
use priopool_queue::Payload;
use serde_json::Value;

/// Name of the simulated payload.
pub const SIMULATED_TASK: &str = "simulated_heavy_task";

/// Values starting with this prefix make the simulated payload fail.
pub const FAIL_PREFIX: &str = "fail";

/// A payload that sleeps for `duration`.
///
/// It fails instead when its first argument starts with `fail`, which lets
/// the console show how the pool handles payload errors.
pub fn simulated_task(duration: Duration) -> Payload {
    Payload::new(SIMULATED_TASK, move |args: &[Value]| {
        let value = args.first().and_then(Value::as_str).unwrap_or_default();
        if value.starts_with(FAIL_PREFIX) {
            return Err(PayloadError::new(format!("simulated failure for {}", value)));
        }

        thread::sleep(duration);
        Ok(())
    })
}

/// Names and priorities for a batch of `count` tasks.
///
/// Priorities rotate through high, medium and low from a time-based offset.
pub fn batch(count: usize) -> Vec<(Priority, String)> {
    let millis = Utc::now().timestamp_millis().rem_euclid(10_000);
    let offset = millis as usize;

    (0..count)
        .map(|i| {
            let priority = Priority::ALL[(offset + i) % Priority::ALL.len()];
            (priority, format!("batch-{}-{}", millis, i))
        })
        .collect()
}
