//! In-process task broker
//!
//! Holds one FIFO per `QueuePriority` behind a single async lock. Workers
//! block in `dequeue` on a `Notify` until a task is ready, its delay has
//! elapsed, or the broker closes.

use std::collections::{BTreeMap, HashSet, VecDeque};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ProcessError, QueuePriority, Task, TaskDistributor, TaskError, TaskInfo, TaskSource};
use crate::adapters::shared::BackoffConfig;

/// Redelivery schedule used when none is supplied
pub fn default_redelivery_backoff() -> BackoffConfig {
    BackoffConfig {
        max_attempts: u32::MAX,
        initial_delay_ms: 1_000,
        max_delay_ms: 60_000,
        jitter_ms: 250,
    }
}

/// Archived tasks retained for inspection; older entries are evicted
pub const DEFAULT_ARCHIVE_LIMIT: usize = 1_000;

/// Task that reached a terminal failure
#[derive(Debug, Clone)]
pub struct ArchivedTask {
    pub task: Task,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrokerStats {
    pub pending: usize,
    pub in_flight: usize,
    /// Total archived since start, including evicted entries
    pub archived: usize,
    pub completed: u64,
}

struct Pending {
    ready_at: Instant,
    task: Task,
}

#[derive(Default)]
struct BrokerState {
    queues: BTreeMap<QueuePriority, VecDeque<Pending>>,
    in_flight: HashSet<Uuid>,
    unique_keys: HashSet<String>,
    archived: VecDeque<ArchivedTask>,
    archived_total: usize,
    archive_limit: usize,
    completed: u64,
    closed: bool,
}

impl BrokerState {
    fn push(&mut self, task: Task, ready_at: Instant) {
        self.queues
            .entry(task.options.queue)
            .or_default()
            .push_back(Pending { ready_at, task });
    }

    /// Oldest ready task of the highest-priority queue that has one
    fn take_ready(&mut self, now: Instant) -> Option<Task> {
        for queue in self.queues.values_mut() {
            if let Some(pos) = queue.iter().position(|p| p.ready_at <= now) {
                return queue.remove(pos).map(|p| p.task);
            }
        }
        None
    }

    fn next_ready_at(&self) -> Option<Instant> {
        self.queues
            .values()
            .flat_map(|queue| queue.iter().map(|p| p.ready_at))
            .min()
    }

    fn release(&mut self, task: &Task) {
        self.in_flight.remove(&task.id);
        if let Some(key) = &task.options.unique_key {
            self.unique_keys.remove(key);
        }
    }

    fn archive(&mut self, task: Task, reason: String) {
        self.release(&task);
        warn!(
            task_id = %task.id,
            task_type = %task.kind,
            retried = task.retried,
            reason = %reason,
            "[BROKER] Task archived"
        );
        self.archived_total += 1;
        if self.archive_limit == 0 {
            return;
        }
        if self.archived.len() >= self.archive_limit {
            self.archived.pop_front();
        }
        self.archived.push_back(ArchivedTask { task, reason });
    }
}

pub struct MemoryBroker {
    state: Mutex<BrokerState>,
    notify: Notify,
    backoff: BackoffConfig,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BrokerState {
                archive_limit: DEFAULT_ARCHIVE_LIMIT,
                ..BrokerState::default()
            }),
            notify: Notify::new(),
            backoff: default_redelivery_backoff(),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Keep at most `limit` archived tasks, dropping the oldest first
    pub fn with_archive_limit(mut self, limit: usize) -> Self {
        self.state.get_mut().archive_limit = limit;
        self
    }

    /// Stop accepting tasks and wake every waiting consumer
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if !state.closed {
            state.closed = true;
            info!("[BROKER] Closed");
        }
        drop(state);
        self.notify.notify_waiters();
    }

    pub async fn stats(&self) -> BrokerStats {
        let state = self.state.lock().await;
        BrokerStats {
            pending: state.queues.values().map(VecDeque::len).sum(),
            in_flight: state.in_flight.len(),
            archived: state.archived_total,
            completed: state.completed,
        }
    }

    /// Most recent archived tasks, oldest first
    pub async fn archived(&self) -> Vec<ArchivedTask> {
        self.state.lock().await.archived.iter().cloned().collect()
    }
}

#[async_trait]
impl TaskDistributor for MemoryBroker {
    async fn enqueue(&self, task: Task) -> Result<TaskInfo, TaskError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(TaskError::Closed);
        }
        if let Some(key) = &task.options.unique_key {
            if !state.unique_keys.insert(key.clone()) {
                return Err(TaskError::Conflict(key.clone()));
            }
        }

        let info = TaskInfo { id: task.id, queue: task.options.queue };
        debug!(
            task_id = %task.id,
            task_type = %task.kind,
            queue = info.queue.as_str(),
            delay_ms = task.options.delay.as_millis() as u64,
            "[BROKER] Task enqueued"
        );
        let ready_at = Instant::now() + task.options.delay;
        state.push(task, ready_at);
        drop(state);

        self.notify.notify_waiters();
        Ok(info)
    }
}

#[async_trait]
impl TaskSource for MemoryBroker {
    async fn dequeue(&self) -> Option<Task> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before inspecting state so a concurrent enqueue is not missed
            notified.as_mut().enable();

            let next_ready = {
                let mut state = self.state.lock().await;
                if state.closed {
                    return None;
                }
                if let Some(task) = state.take_ready(Instant::now()) {
                    state.in_flight.insert(task.id);
                    return Some(task);
                }
                state.next_ready_at()
            };

            match next_ready {
                Some(at) => {
                    tokio::select! {
                        _ = &mut notified => {}
                        _ = tokio::time::sleep_until(at) => {}
                    }
                }
                None => notified.await,
            }
        }
    }

    async fn complete(&self, task: &Task) {
        let mut state = self.state.lock().await;
        state.release(task);
        state.completed += 1;
    }

    async fn fail(&self, mut task: Task, error: &ProcessError) {
        let mut state = self.state.lock().await;
        match error {
            ProcessError::SkipRetry(reason) => state.archive(task, reason.clone()),
            ProcessError::Retry(reason) if task.retried >= task.options.max_retry => {
                state.archive(task, format!("retries exhausted: {}", reason));
            }
            ProcessError::Retry(reason) => {
                state.in_flight.remove(&task.id);
                let delay = self.backoff.delay_for(task.retried);
                task.retried += 1;
                info!(
                    task_id = %task.id,
                    retried = task.retried,
                    max_retry = task.options.max_retry,
                    delay_ms = delay.as_millis() as u64,
                    reason = %reason,
                    "[BROKER] Task scheduled for redelivery"
                );
                state.push(task, Instant::now() + delay);
                drop(state);
                self.notify.notify_waiters();
            }
        }
    }
}
