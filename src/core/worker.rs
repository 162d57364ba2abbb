//! Order decision worker
//!
//! Handles `task:process_order`: decode the news message, score the
//! headline, decide, and execute on the first symbol.
//!
//! # Failure policy
//! | Failure | Result |
//! |---|---|
//! | Undecodable payload, no symbols | `SkipRetry` |
//! | Scorer error | `SkipRetry` |
//! | Buy error | `SkipRetry` (market orders are not idempotent) |
//! | Sell error | `Retry` |

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

use crate::adapters::SentimentScorer;
use crate::core::decision::{decide, Decision};
use crate::core::execution::{OrderExecutor, TradeOutcome};
use crate::core::tasks::{ProcessError, Task, TaskHandler};
use crate::core::types::NewsMessage;

/// Executed message ids remembered for duplicate suppression
pub const DEFAULT_EXECUTED_CAPACITY: usize = 1_024;

/// Bounded set of ids; inserting past capacity forgets the oldest
#[derive(Debug)]
struct RecentIds {
    ids: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl RecentIds {
    fn new(capacity: usize) -> Self {
        Self { ids: HashSet::new(), order: VecDeque::new(), capacity }
    }

    fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn insert(&mut self, id: String) {
        if self.capacity == 0 || self.ids.contains(&id) {
            return;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        self.ids.insert(id.clone());
        self.order.push_back(id);
    }
}

pub struct OrderDecisionWorker {
    scorer: Arc<dyn SentimentScorer>,
    executor: OrderExecutor,
    /// Message ids whose order action already succeeded
    executed: Mutex<RecentIds>,
}

impl OrderDecisionWorker {
    pub fn new(scorer: Arc<dyn SentimentScorer>, executor: OrderExecutor) -> Self {
        Self::with_capacity(scorer, executor, DEFAULT_EXECUTED_CAPACITY)
    }

    pub fn with_capacity(
        scorer: Arc<dyn SentimentScorer>,
        executor: OrderExecutor,
        capacity: usize,
    ) -> Self {
        Self { scorer, executor, executed: Mutex::new(RecentIds::new(capacity)) }
    }

    fn executed(&self) -> std::sync::MutexGuard<'_, RecentIds> {
        self.executed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn act(
        &self,
        message: &NewsMessage,
        symbol: &str,
        score: i64,
    ) -> Result<Option<TradeOutcome>, ProcessError> {
        match decide(score, message.risk) {
            Decision::Buy => self
                .executor
                .buy_position(score, symbol, message.risk)
                .await
                .map(Some)
                .map_err(|e| ProcessError::SkipRetry(format!("buy {} failed: {}", symbol, e))),
            Decision::Sell => self
                .executor
                .sell_position(symbol, score, message.risk)
                .await
                .map(Some)
                .map_err(|e| ProcessError::Retry(format!("sell {} failed: {}", symbol, e))),
            Decision::Hold => Ok(None),
        }
    }
}

#[async_trait]
impl TaskHandler for OrderDecisionWorker {
    async fn handle(&self, task: &Task) -> Result<(), ProcessError> {
        let message: NewsMessage = serde_json::from_slice(&task.payload)
            .map_err(|e| ProcessError::SkipRetry(format!("undecodable payload: {}", e)))?;

        if self.executed().contains(&message.id) {
            info!(message_id = %message.id, "[WORKER] Message already executed, skipping");
            return Ok(());
        }

        let symbol = message
            .primary_symbol()
            .ok_or_else(|| ProcessError::SkipRetry(format!("message {} has no symbols", message.id)))?;

        let score = self.scorer.score(&message.headline).await.map_err(|e| {
            ProcessError::SkipRetry(format!("sentiment scoring failed: {}", e))
        })?;

        info!(
            message_id = %message.id,
            symbol = %symbol,
            score,
            risk = %message.risk,
            decision = ?decide(score, message.risk),
            headline = %message.headline,
            "[WORKER] Headline scored"
        );

        if let Some(outcome) = self.act(&message, symbol, score).await? {
            info!(message_id = %message.id, outcome = ?outcome, "[WORKER] Order action done");
            self.executed().insert(message.id.clone());
        }
        Ok(())
    }
}
