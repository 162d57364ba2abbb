//! Session monitor
//!
//! Polls the account on a fixed interval and ends the session when:
//! 1. Equity reaches the gain target (positions closed)
//! 2. No day trades remain (positions left open)
//! 3. The market is about to close (positions closed)
//!
//! Stop conditions fire at most once: a tick after shutdown is a no-op.
//! A gateway error shuts the session down and is returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::adapters::{AccountGateway, GatewayResult};
use crate::core::session::SessionContext;
use crate::core::types::SessionOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    GainTargetReached { equity: Decimal },
    DayTradesExhausted,
    MarketClosing,
}

impl StopReason {
    /// Whether open positions are liquidated before stopping
    pub fn closes_positions(&self) -> bool {
        !matches!(self, StopReason::DayTradesExhausted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stopped(StopReason),
    AlreadyStopped,
}

pub struct SessionMonitor {
    gateway: Arc<dyn AccountGateway>,
    context: Arc<SessionContext>,
    options: SessionOptions,
    interval: Duration,
    closing_window: Duration,
}

impl SessionMonitor {
    pub fn new(
        gateway: Arc<dyn AccountGateway>,
        context: Arc<SessionContext>,
        options: SessionOptions,
        interval: Duration,
        closing_window: Duration,
    ) -> Self {
        Self { gateway, context, options, interval, closing_window }
    }

    /// One evaluation of the stop conditions
    pub async fn tick(&self) -> GatewayResult<TickOutcome> {
        if self.context.is_shutdown() {
            debug!("[MONITOR] Session already stopped, skipping tick");
            return Ok(TickOutcome::AlreadyStopped);
        }

        match self.evaluate().await {
            Ok(TickOutcome::Stopped(reason)) => {
                info!(reason = ?reason, "[MONITOR] Stopping session");
                self.context.shutdown();
                Ok(TickOutcome::Stopped(reason))
            }
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(error = %e, "[MONITOR] Account check failed, stopping session");
                self.context.shutdown();
                Err(e)
            }
        }
    }

    async fn evaluate(&self) -> GatewayResult<TickOutcome> {
        let have_trades = self.gateway.have_trades().await?;
        let equity = self.gateway.equity().await?;
        let closing = self.gateway.can_close_positions(self.closing_window).await?;

        let target = self.options.target_equity();
        info!(
            equity = %equity,
            target = %target,
            have_trades,
            closing,
            "[MONITOR] Session check"
        );

        let reason = if equity >= target {
            StopReason::GainTargetReached { equity }
        } else if !have_trades {
            StopReason::DayTradesExhausted
        } else if closing {
            StopReason::MarketClosing
        } else {
            return Ok(TickOutcome::Continue);
        };

        if reason.closes_positions() {
            self.gateway.close_all_positions(true).await?;
            info!(reason = ?reason, "[MONITOR] All positions closed");
        } else {
            warn!("[MONITOR] Day trade limit reached, leaving positions open");
        }
        Ok(TickOutcome::Stopped(reason))
    }

    /// Tick every interval until a stop condition fires or the session stops
    ///
    /// Returns the reason when this monitor stopped the session, `None` when
    /// it was stopped elsewhere.
    pub async fn run(&self) -> GatewayResult<Option<StopReason>> {
        info!(
            interval_secs = self.interval.as_secs(),
            starting_equity = %self.options.starting_equity(),
            target = %self.options.target_equity(),
            "[MONITOR] Starting session monitor"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = self.context.cancelled() => {
                    info!("[MONITOR] Session stopped, monitor exiting");
                    return Ok(None);
                }
                _ = ticker.tick() => {}
            }
            match self.tick().await? {
                TickOutcome::Continue => {}
                TickOutcome::Stopped(reason) => return Ok(Some(reason)),
                TickOutcome::AlreadyStopped => return Ok(None),
            }
        }
    }
}
