//! Worker threads.

use std::cell::Cell;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use priopool_models::{HistoryRecord, PayloadError};
use priopool_queue::Task;
use tracing::{debug, trace, warn};

use crate::state::Shared;

thread_local! {
    /// Address of the shared state of the pool whose worker runs on this thread.
    static CURRENT_POOL: Cell<usize> = const { Cell::new(0) };
}

/// Returns true if the calling thread is one of the workers of `shared`.
pub(crate) fn is_worker_of(shared: &Arc<Shared>) -> bool {
    CURRENT_POOL.with(|current| current.get() == Arc::as_ptr(shared) as usize)
}

/// One persistent execution unit pulling tasks from the shared queue.
pub(crate) struct Worker {
    index: usize,
    shared: Arc<Shared>,
}

impl Worker {
    /// Spawns worker `index` on a named thread.
    pub(crate) fn spawn(index: usize, shared: Arc<Shared>) -> io::Result<JoinHandle<()>> {
        let name = format!("{}-{}", shared.config.thread_name, index);
        let worker = Worker { index, shared };

        thread::Builder::new().name(name).spawn(move || worker.run())
    }

    /// Runs until shutdown has begun and the queue is empty.
    ///
    /// While the pool is paused the dequeue call itself waits, so no task
    /// leaves the queue until resume. In-flight work is never interrupted.
    fn run(self) {
        CURRENT_POOL.with(|current| current.set(Arc::as_ptr(&self.shared) as usize));
        debug!(worker = self.index, "worker started");
        let poll_interval = self.shared.config.poll_interval;

        loop {
            if self.shared.queue.is_drained() {
                break;
            }

            let task = self.shared.queue.dequeue_with(poll_interval, |task| {
                self.shared.state().start(self.index, task.info().clone());
            });

            match task {
                Some(task) => self.execute(task),
                None => continue,
            }
        }

        debug!(worker = self.index, "worker stopped");
    }

    /// Runs one task and records its outcome.
    fn execute(&self, task: Task) {
        let (info, payload) = task.into_parts();
        trace!(
            worker = self.index,
            task_id = %info.id,
            priority = %info.priority,
            name = %info.name,
            "task started"
        );

        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| payload.invoke(&info.args)))
            .unwrap_or_else(|panic| Err(PayloadError::from_panic(panic.as_ref())));
        let elapsed = started.elapsed();

        let failure = match result {
            Ok(()) => None,
            Err(err) => {
                warn!(
                    worker = self.index,
                    task_id = %info.id,
                    priority = %info.priority,
                    error = %err,
                    "task failed"
                );
                Some(err.to_string())
            }
        };

        let record = HistoryRecord::new(&info, self.index, elapsed, failure);
        trace!(
            worker = self.index,
            task_id = %info.id,
            duration = record.duration,
            "task finished"
        );

        self.shared.state().finish(self.index, record);
    }
}
