//! Task channel between news ingestion and order execution
//!
//! # Delivery contract
//! - Priority-then-FIFO: the critical queue drains before the default queue
//! - A task is leased to exactly one worker at a time
//! - `ProcessError::Retry` redelivers up to `max_retry` times, with backoff
//! - `ProcessError::SkipRetry` (or an exhausted retry budget) archives the task
//! - Enqueueing a task whose unique key is still live returns `TaskError::Conflict`

pub mod broker;
pub mod processor;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::types::NewsMessage;

/// Task type for scoring a headline and trading on it
pub const TASK_PROCESS_ORDER: &str = "task:process_order";

// =============================================================================
// Errors
// =============================================================================

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Task payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Task conflicts with live task key {0}")]
    Conflict(String),

    #[error("Task broker is closed")]
    Closed,
}

/// Failure reported by a task handler
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// Redeliver if the retry budget allows
    #[error("{0}")]
    Retry(String),

    /// Archive without redelivery
    #[error("{0} (skip retry)")]
    SkipRetry(String),
}

// =============================================================================
// Task
// =============================================================================

/// Named queues, in dequeue priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueuePriority {
    #[default]
    Critical,
    Default,
}

impl QueuePriority {
    pub const ALL: [QueuePriority; 2] = [QueuePriority::Critical, QueuePriority::Default];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueuePriority::Critical => "critical",
            QueuePriority::Default => "default",
        }
    }
}

/// Delivery options attached at enqueue time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOptions {
    /// Wait before the task becomes visible
    pub delay: Duration,
    pub queue: QueuePriority,
    /// Redeliveries allowed after a retryable failure
    pub max_retry: u32,
    /// Deduplication key, held until the task completes or is archived
    pub unique_key: Option<String>,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            queue: QueuePriority::Default,
            max_retry: 0,
            unique_key: None,
        }
    }
}

/// Serialized unit of deferred work
#[derive(Debug, Clone)]
pub struct Task {
    pub id: Uuid,
    pub kind: String,
    pub payload: Vec<u8>,
    pub options: TaskOptions,
    /// Deliveries that already failed with `Retry`
    pub retried: u32,
}

impl Task {
    pub fn new(kind: &str, payload: Vec<u8>, options: TaskOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.to_string(),
            payload,
            options,
            retried: 0,
        }
    }

    /// Process-order task for `message`, unique per message id
    pub fn process_order(message: &NewsMessage, mut options: TaskOptions) -> Result<Self, TaskError> {
        let payload = serde_json::to_vec(message)?;
        options.unique_key = Some(format!("news:{}", message.id));
        Ok(Self::new(TASK_PROCESS_ORDER, payload, options))
    }

    pub fn payload_lossy(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Broker receipt for an enqueued task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub id: Uuid,
    pub queue: QueuePriority,
}

// =============================================================================
// Traits
// =============================================================================

/// Producer side of the task channel
#[async_trait]
pub trait TaskDistributor: Send + Sync {
    async fn enqueue(&self, task: Task) -> Result<TaskInfo, TaskError>;
}

/// Consumer side of the task channel
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Wait for the next ready task; `None` once the source is closed
    async fn dequeue(&self) -> Option<Task>;

    /// Acknowledge a successfully handled task
    async fn complete(&self, task: &Task);

    /// Report a failed delivery; the source decides on redelivery
    async fn fail(&self, task: Task, error: &ProcessError);
}

/// Handler for one task type
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: &Task) -> Result<(), ProcessError>;
}

pub use broker::{ArchivedTask, BrokerStats, MemoryBroker};
pub use processor::TaskProcessor;
