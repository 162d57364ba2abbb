//! Worker pool draining a `TaskSource`
//!
//! Routes each task to the handler registered for its type. Workers stop
//! taking new tasks once the shutdown token fires; a task already being
//! handled runs to completion.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use super::{ProcessError, Task, TaskHandler, TaskSource};

pub struct TaskProcessor {
    source: Arc<dyn TaskSource>,
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
    concurrency: usize,
}

impl TaskProcessor {
    pub fn new(source: Arc<dyn TaskSource>, concurrency: usize) -> Self {
        Self {
            source,
            handlers: HashMap::new(),
            concurrency: concurrency.max(1),
        }
    }

    /// Register the handler for a task type
    pub fn handle(mut self, kind: &str, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.insert(kind.to_string(), handler);
        self
    }

    /// Handle one task and report the result to the source
    pub async fn dispatch(&self, task: Task) {
        let result = match self.handlers.get(&task.kind) {
            Some(handler) => handler.handle(&task).await,
            None => Err(ProcessError::SkipRetry(format!(
                "no handler registered for task type {}",
                task.kind
            ))),
        };

        match result {
            Ok(()) => {
                debug!(task_id = %task.id, task_type = %task.kind, "[WORKER] Task completed");
                self.source.complete(&task).await;
            }
            Err(e) => {
                error!(
                    task_id = %task.id,
                    task_type = %task.kind,
                    payload = %task.payload_lossy(),
                    error = %e,
                    "[WORKER] process task failed"
                );
                self.source.fail(task, &e).await;
            }
        }
    }

    /// Run the pool until `shutdown` fires or the source closes
    pub async fn run(self, shutdown: CancellationToken) {
        let processor = Arc::new(self);
        let tracker = TaskTracker::new();

        info!(concurrency = processor.concurrency, "[WORKER] Starting worker pool");
        for worker in 0..processor.concurrency {
            let processor = processor.clone();
            let shutdown = shutdown.clone();
            tracker.spawn(async move {
                loop {
                    let task = tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => break,
                        task = processor.source.dequeue() => match task {
                            Some(task) => task,
                            None => break,
                        },
                    };
                    processor.dispatch(task).await;
                }
                debug!(worker, "[WORKER] Worker stopped");
            });
        }
        tracker.close();
        tracker.wait().await;
        info!("[WORKER] Worker pool stopped");
    }
}
