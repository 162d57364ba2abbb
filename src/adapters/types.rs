//! Core data types for the brokerage gateway
//!
//! Account, clock, position and order shapes shared by every
//! `AccountGateway` implementation. Money values use `Decimal`, decoded
//! from the brokerage's decimal strings.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

// =============================================================================
// Pattern Day Trader limits
// =============================================================================

/// Day trades allowed in a rolling window before PDT restrictions apply
pub const PDT_DAY_TRADE_LIMIT: i64 = 3;

/// Equity above which the PDT day-trade limit does not apply (25 000 USD)
pub const PDT_MIN_EQUITY: Decimal = Decimal::from_parts(25_000, 0, 0, false, 0);

/// Distance of the protective stop from the fill price (10%)
pub const STOP_LOSS_OFFSET: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

// =============================================================================
// Shared HTTP Client Builder
// =============================================================================

/// HTTP request timeout (seconds)
pub const HTTP_TIMEOUT_SECS: u64 = 10;
/// HTTP connection timeout (milliseconds)
const HTTP_CONNECT_TIMEOUT_MS: u64 = 3000;
/// Max idle connections per host in connection pool
const HTTP_POOL_MAX_IDLE: usize = 5;
/// How long idle connections stay in the pool (seconds)
const HTTP_POOL_IDLE_TIMEOUT_SECS: u64 = 60;

/// Create the pooled HTTP client used by the gateway and the scorer
pub fn create_http_client(service_name: &str) -> reqwest::Client {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .pool_max_idle_per_host(HTTP_POOL_MAX_IDLE)
        .pool_idle_timeout(Duration::from_secs(HTTP_POOL_IDLE_TIMEOUT_SECS))
        .connect_timeout(Duration::from_millis(HTTP_CONNECT_TIMEOUT_MS))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new());
    tracing::info!(
        phase = "init",
        service = %service_name,
        timeout_s = HTTP_TIMEOUT_SECS,
        connect_timeout_ms = HTTP_CONNECT_TIMEOUT_MS,
        pool_max_idle = HTTP_POOL_MAX_IDLE,
        "HTTP client configured"
    );
    client
}

// =============================================================================
// Orders
// =============================================================================

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Side that unwinds an order on this side
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
    TrailingStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    Day,
    Gtc,
    Ioc,
    Fok,
}

/// Order submission body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub qty: Decimal,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Decimal>,
}

impl OrderRequest {
    /// Market order good for the day
    pub fn market(symbol: &str, qty: i64, side: OrderSide) -> Self {
        Self {
            symbol: symbol.to_string(),
            qty: Decimal::from(qty),
            side,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Day,
            stop_price: None,
        }
    }

    /// Stop order good for the day
    pub fn stop(symbol: &str, qty: Decimal, side: OrderSide, stop_price: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            qty,
            side,
            order_type: OrderType::Stop,
            time_in_force: TimeInForce::Day,
            stop_price: Some(stop_price),
        }
    }
}

/// Order as reported by the brokerage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub symbol: String,
    pub side: OrderSide,
    #[serde(default)]
    pub qty: Option<Decimal>,
    #[serde(default)]
    pub filled_qty: Decimal,
    #[serde(default)]
    pub filled_avg_price: Option<Decimal>,
    #[serde(default)]
    pub status: String,
}

/// Stop price protecting an entry, rounded half-up to cents
///
/// Longs stop out 10% below the fill (90%), shorts 10% above it (110%).
pub fn stop_loss_price(filled_avg_price: Decimal, entry_side: OrderSide) -> Decimal {
    let ratio = match entry_side {
        OrderSide::Buy => Decimal::ONE - STOP_LOSS_OFFSET,
        OrderSide::Sell => Decimal::ONE + STOP_LOSS_OFFSET,
    };
    (filled_avg_price * ratio).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// =============================================================================
// Account, positions, clock
// =============================================================================

/// Open position for one symbol (negative qty for shorts)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub symbol: String,
    pub qty: Decimal,
    #[serde(default)]
    pub qty_available: Decimal,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub avg_entry_price: Decimal,
}

/// Account state snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub equity: Decimal,
    #[serde(default)]
    pub cash: Decimal,
    #[serde(default)]
    pub buying_power: Decimal,
    #[serde(default)]
    pub daytrading_buying_power: Decimal,
    #[serde(default)]
    pub daytrade_count: i64,
    #[serde(default)]
    pub account_blocked: bool,
    #[serde(default)]
    pub trading_blocked: bool,
}

impl AccountSnapshot {
    /// False once the PDT limit is hit on an account under the equity floor
    pub fn has_day_trades_left(&self) -> bool {
        !(self.daytrade_count >= PDT_DAY_TRADE_LIMIT && self.equity < PDT_MIN_EQUITY)
    }

    pub fn is_blocked(&self) -> bool {
        self.account_blocked || self.trading_blocked
    }
}

/// Market clock as reported by the brokerage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketClock {
    pub timestamp: DateTime<Utc>,
    pub is_open: bool,
    pub next_open: DateTime<Utc>,
    pub next_close: DateTime<Utc>,
}

impl MarketClock {
    /// Market is open and the close is less than `window` away
    pub fn in_closing_window(&self, window: Duration) -> bool {
        let window = chrono::Duration::seconds(window.as_secs() as i64);
        self.is_open && self.timestamp > self.next_close - window
    }
}

/// Human-readable wait between two instants ("42 minutes", "3 hours", "2 days")
pub fn describe_wait(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    let minutes = (to - from).num_minutes().max(0);
    if minutes < 60 {
        format!("{} minutes", minutes)
    } else if minutes < 24 * 60 {
        format!("{} hours", minutes / 60)
    } else {
        format!("{} days", minutes / (24 * 60))
    }
}
