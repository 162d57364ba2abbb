//! Order execution
//!
//! Turns a buy/sell decision into brokerage orders:
//! - Sizes the order from buying power and the last quote
//! - Sells an existing long outright, or opens a short when flat
//! - Places a market order, waits for it to settle, then attaches a stop loss
//!
//! # Degraded inputs
//! A missing or non-positive quote falls back to `FALLBACK_QUOTE_PRICE`.
//! A zero quantity skips the order. Both are logged, neither is an error.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::adapters::{AccountGateway, GatewayResult, OrderRequest, OrderSide};
use crate::core::sizing::{PositionSizer, SizingStrategy};
use crate::core::types::RiskTier;

// =============================================================================
// Constants
// =============================================================================

/// Price assumed when no usable quote is available
pub const FALLBACK_QUOTE_PRICE: f64 = 20.0;

/// Buying power required before opening a short (2 000 USD)
pub const MIN_SHORT_BUYING_POWER: Decimal = Decimal::from_parts(2_000, 0, 0, false, 0);

// =============================================================================
// Types
// =============================================================================

/// Result of one buy/sell request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeOutcome {
    /// Market order accepted; `stop_loss` is false when attaching it failed
    Placed { order_id: String, qty: i64, stop_loss: bool },
    /// Nothing was sent
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ZeroQuantity,
    NothingToSell,
    InsufficientBuyingPower,
}

// =============================================================================
// Executor
// =============================================================================

pub struct OrderExecutor {
    gateway: Arc<dyn AccountGateway>,
    settle_delay: Duration,
}

impl OrderExecutor {
    pub fn new(gateway: Arc<dyn AccountGateway>, settle_delay: Duration) -> Self {
        Self { gateway, settle_delay }
    }

    /// Last quote for the side, or the fallback price
    async fn quote_or_fallback(&self, symbol: &str, side: OrderSide) -> f64 {
        match self.gateway.last_quote(symbol, side).await {
            Ok(price) if price.is_finite() && price > 0.0 => price,
            Ok(price) => {
                warn!(
                    symbol = %symbol,
                    quote = price,
                    fallback = FALLBACK_QUOTE_PRICE,
                    "[TRADE] Unusable quote, using fallback price"
                );
                FALLBACK_QUOTE_PRICE
            }
            Err(e) => {
                warn!(
                    symbol = %symbol,
                    error = %e,
                    fallback = FALLBACK_QUOTE_PRICE,
                    "[TRADE] Quote unavailable, using fallback price"
                );
                FALLBACK_QUOTE_PRICE
            }
        }
    }

    /// Order quantity for a score on `symbol`
    pub async fn quantity(
        &self,
        score: i64,
        symbol: &str,
        side: OrderSide,
        risk: RiskTier,
    ) -> GatewayResult<i64> {
        let buying_power = self.gateway.buying_power().await?.to_f64().unwrap_or(0.0);
        let price = self.quote_or_fallback(symbol, side).await;
        let qty = PositionSizer::for_tier(risk).compute(buying_power, price, score, side);
        info!(
            symbol = %symbol,
            side = %side,
            score,
            risk = %risk,
            buying_power,
            price,
            qty,
            "[TRADE] Sized order"
        );
        Ok(qty)
    }

    pub async fn buy_position(
        &self,
        score: i64,
        symbol: &str,
        risk: RiskTier,
    ) -> GatewayResult<TradeOutcome> {
        let qty = self.quantity(score, symbol, OrderSide::Buy, risk).await?;
        self.trade_order(symbol, qty, OrderSide::Buy).await
    }

    /// Liquidate an existing long, or open a short when flat
    pub async fn sell_position(
        &self,
        symbol: &str,
        score: i64,
        risk: RiskTier,
    ) -> GatewayResult<TradeOutcome> {
        match self.gateway.position(symbol).await? {
            Some(position) if position.qty_available > Decimal::ZERO => {
                let qty = position.qty.abs().trunc().to_i64().unwrap_or(0);
                info!(symbol = %symbol, qty, "[TRADE] Selling existing position");
                self.trade_order(symbol, qty, OrderSide::Sell).await
            }
            Some(position) => {
                info!(
                    symbol = %symbol,
                    qty = %position.qty,
                    qty_available = %position.qty_available,
                    "[TRADE] Position has nothing available to sell"
                );
                Ok(TradeOutcome::Skipped(SkipReason::NothingToSell))
            }
            None => {
                let buying_power = self.gateway.buying_power().await?;
                if buying_power < MIN_SHORT_BUYING_POWER {
                    info!(
                        symbol = %symbol,
                        buying_power = %buying_power,
                        "[TRADE] Not enough buying power to short"
                    );
                    return Ok(TradeOutcome::Skipped(SkipReason::InsufficientBuyingPower));
                }
                let qty = self.quantity(score, symbol, OrderSide::Sell, risk).await?;
                self.trade_order(symbol, qty, OrderSide::Sell).await
            }
        }
    }

    /// Market order followed by a protective stop
    pub async fn trade_order(
        &self,
        symbol: &str,
        qty: i64,
        side: OrderSide,
    ) -> GatewayResult<TradeOutcome> {
        if qty <= 0 {
            info!(symbol = %symbol, side = %side, qty, "[TRADE] Order not sent, quantity is zero");
            return Ok(TradeOutcome::Skipped(SkipReason::ZeroQuantity));
        }

        let placed = self
            .gateway
            .place_order(&OrderRequest::market(symbol, qty, side))
            .await?;

        tokio::time::sleep(self.settle_delay).await;

        let stop_loss = match self.gateway.attach_stop_loss(&placed.id).await {
            Ok(stop) => {
                info!(order_id = %placed.id, stop_order_id = %stop.id, "[TRADE] Stop loss attached");
                true
            }
            Err(e) => {
                warn!(order_id = %placed.id, error = %e, "[TRADE] Failed to attach stop loss");
                false
            }
        };

        Ok(TradeOutcome::Placed { order_id: placed.id, qty, stop_loss })
    }
}
