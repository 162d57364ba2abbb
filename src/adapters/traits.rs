//! Gateway and scorer traits
//!
//! `AccountGateway` is the brokerage facade used by ingestion, execution
//! and the session monitor. Implementations provide the raw REST calls;
//! derived checks (PDT eligibility, market hours, stop-loss attachment)
//! are provided methods so every implementation behaves the same.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use crate::adapters::errors::{GatewayError, GatewayResult, ScorerResult};
use crate::adapters::types::{
    describe_wait, stop_loss_price, AccountSnapshot, MarketClock, OrderRequest,
    OrderResponse, OrderSide, PositionInfo,
};

/// Brokerage account facade
#[async_trait]
pub trait AccountGateway: Send + Sync {
    /// Name used in logs (e.g., "alpaca")
    fn gateway_name(&self) -> &'static str;

    async fn account(&self) -> GatewayResult<AccountSnapshot>;

    async fn clock(&self) -> GatewayResult<MarketClock>;

    /// Latest quote: ask price for buys, bid price for sells
    async fn last_quote(&self, symbol: &str, side: OrderSide) -> GatewayResult<f64>;

    /// Open position for `symbol`, `None` when flat
    async fn position(&self, symbol: &str) -> GatewayResult<Option<PositionInfo>>;

    async fn place_order(&self, order: &OrderRequest) -> GatewayResult<OrderResponse>;

    async fn order(&self, order_id: &str) -> GatewayResult<OrderResponse>;

    async fn close_all_positions(&self, cancel_orders: bool) -> GatewayResult<()>;

    async fn equity(&self) -> GatewayResult<Decimal> {
        Ok(self.account().await?.equity)
    }

    async fn cash(&self) -> GatewayResult<Decimal> {
        Ok(self.account().await?.cash)
    }

    async fn buying_power(&self) -> GatewayResult<Decimal> {
        Ok(self.account().await?.buying_power)
    }

    async fn day_trading_buying_power(&self) -> GatewayResult<Decimal> {
        Ok(self.account().await?.daytrading_buying_power)
    }

    async fn day_trade_count(&self) -> GatewayResult<i64> {
        Ok(self.account().await?.daytrade_count)
    }

    async fn is_blocked(&self) -> GatewayResult<bool> {
        Ok(self.account().await?.is_blocked())
    }

    /// Whether the account may still day-trade under PDT rules
    async fn have_trades(&self) -> GatewayResult<bool> {
        let account = self.account().await?;
        let allowed = account.has_day_trades_left();
        if !allowed {
            info!(
                gateway = self.gateway_name(),
                daytrade_count = account.daytrade_count,
                equity = %account.equity,
                "[GATEWAY] Day trade limit reached"
            );
        }
        Ok(allowed)
    }

    async fn is_market_open(&self) -> GatewayResult<bool> {
        let clock = self.clock().await?;
        if !clock.is_open {
            info!(
                gateway = self.gateway_name(),
                next_open = %clock.next_open,
                "[GATEWAY] Market is closed, opens in {}",
                describe_wait(clock.timestamp, clock.next_open)
            );
        }
        Ok(clock.is_open)
    }

    /// True inside the final `window` before the market closes
    async fn can_close_positions(&self, window: Duration) -> GatewayResult<bool> {
        Ok(self.clock().await?.in_closing_window(window))
    }

    /// Place an opposing stop order at 90% of the fill price of `order_id`
    async fn attach_stop_loss(&self, order_id: &str) -> GatewayResult<OrderResponse> {
        let entry = self.order(order_id).await?;
        let fill_price = entry.filled_avg_price.ok_or_else(|| {
            GatewayError::InvalidResponse(format!("order {} has no fill price yet", order_id))
        })?;
        let qty = entry.qty.unwrap_or(entry.filled_qty);
        let stop = OrderRequest::stop(
            &entry.symbol,
            qty,
            entry.side.opposite(),
            stop_loss_price(fill_price, entry.side),
        );
        info!(
            gateway = self.gateway_name(),
            symbol = %entry.symbol,
            side = %stop.side,
            qty = %qty,
            fill_price = %fill_price,
            stop_price = ?stop.stop_price,
            "[TRADE] Attaching stop loss"
        );
        self.place_order(&stop).await
    }
}

/// Headline sentiment scorer (1-100, above 50 is bullish)
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, headline: &str) -> ScorerResult<i64>;
}
