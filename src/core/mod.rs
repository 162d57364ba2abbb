//! Core module - ingestion, task channel, order decisions, session monitor
//!
//! # Module Architecture
//!
//! This module uses **explicit re-exports** instead of glob exports (`pub use module::*`)
//! to provide better API visibility and prevent accidental public API changes.
//!
//! ## Usage
//! Prefer importing from `crate::core`:
//! ```ignore
//! use crate::core::{MemoryBroker, NewsSession, SessionContext};
//! ```
//!
//! ## Adding New Public Types
//! When adding new public types to submodules, explicitly add them to the
//! re-exports below to make them part of the public API.

pub mod decision;
pub mod decoder;
pub mod execution;
pub mod ingestion;
pub mod monitor;
pub mod runtime;
pub mod session;
pub mod sizing;
pub mod tasks;
pub mod types;
pub mod worker;

// Explicit re-exports for domain types
pub use types::{NewsMessage, RiskTier, SessionOptions};

// Explicit re-exports for decision and sizing
pub use decision::{decide, Decision, Thresholds};
pub use sizing::{PositionSizer, SizingBand, SizingStrategy};

// Explicit re-exports for execution
pub use execution::{OrderExecutor, SkipReason, TradeOutcome, FALLBACK_QUOTE_PRICE};

// Explicit re-exports for the task channel
pub use tasks::{
    ArchivedTask, BrokerStats, MemoryBroker, ProcessError, QueuePriority, Task, TaskDistributor,
    TaskError, TaskHandler, TaskInfo, TaskOptions, TaskProcessor, TaskSource, TASK_PROCESS_ORDER,
};

// Explicit re-exports for the session
pub use decoder::{FeedDecoder, FeedItem};
pub use ingestion::{news_message_from_item, IngestionSettings, NewsSession, SessionEnd};
pub use monitor::{SessionMonitor, StopReason, TickOutcome};
pub use session::SessionContext;
pub use worker::OrderDecisionWorker;

// Explicit re-exports for the runtime
pub use runtime::run_session;
