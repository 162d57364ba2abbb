//! Shared test utilities for gateway and scorer consumers
//!
//! `MockGateway` keeps account, clock, quote and position state in memory
//! and records every order it receives. `MockScorer` returns a fixed score.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::adapters::errors::{GatewayError, GatewayResult, ScorerError, ScorerResult};
use crate::adapters::traits::{AccountGateway, SentimentScorer};
use crate::adapters::types::{
    AccountSnapshot, MarketClock, OrderRequest, OrderResponse, OrderSide, PositionInfo,
};

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).expect("valid decimal literal")
}

/// In-memory brokerage
pub struct MockGateway {
    pub account: Mutex<AccountSnapshot>,
    pub clock: Mutex<MarketClock>,
    /// `None` makes `last_quote` fail
    pub quote: Mutex<Option<f64>>,
    pub positions: Mutex<HashMap<String, PositionInfo>>,
    pub fill_price: Mutex<Decimal>,
    /// When true, `place_order` returns an error
    pub fail_orders: AtomicBool,
    /// When true, every account read returns an error
    pub fail_account: AtomicBool,
    /// When true, `close_all_positions` returns an error
    pub fail_close: AtomicBool,
    /// Fill reported by `order()`; cleared to simulate an unfilled order
    pub report_fills: AtomicBool,
    pub orders: Mutex<Vec<OrderRequest>>,
    responses: Mutex<HashMap<String, OrderResponse>>,
    pub close_all_count: Arc<AtomicU64>,
    pub account_calls: Arc<AtomicU64>,
    pub quote_sides: Mutex<Vec<OrderSide>>,
}

impl MockGateway {
    /// Open market, 10k equity, 20k buying power, quote 50.0, no positions
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            account: Mutex::new(AccountSnapshot {
                equity: dec("10000"),
                cash: dec("10000"),
                buying_power: dec("20000"),
                daytrading_buying_power: dec("40000"),
                daytrade_count: 0,
                account_blocked: false,
                trading_blocked: false,
            }),
            clock: Mutex::new(MarketClock {
                timestamp: now,
                is_open: true,
                next_open: now + ChronoDuration::hours(18),
                next_close: now + ChronoDuration::hours(3),
            }),
            quote: Mutex::new(Some(50.0)),
            positions: Mutex::new(HashMap::new()),
            fill_price: Mutex::new(dec("50.00")),
            fail_orders: AtomicBool::new(false),
            fail_account: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
            report_fills: AtomicBool::new(true),
            orders: Mutex::new(Vec::new()),
            responses: Mutex::new(HashMap::new()),
            close_all_count: Arc::new(AtomicU64::new(0)),
            account_calls: Arc::new(AtomicU64::new(0)),
            quote_sides: Mutex::new(Vec::new()),
        }
    }

    pub fn with_equity(self, equity: &str) -> Self {
        self.account.lock().unwrap().equity = dec(equity);
        self
    }

    pub fn with_buying_power(self, buying_power: &str) -> Self {
        self.account.lock().unwrap().buying_power = dec(buying_power);
        self
    }

    pub fn with_day_trades(self, count: i64) -> Self {
        self.account.lock().unwrap().daytrade_count = count;
        self
    }

    pub fn with_quote(self, quote: Option<f64>) -> Self {
        *self.quote.lock().unwrap() = quote;
        self
    }

    pub fn with_fill_price(self, price: &str) -> Self {
        *self.fill_price.lock().unwrap() = dec(price);
        self
    }

    pub fn with_position(self, symbol: &str, qty: &str, qty_available: &str) -> Self {
        self.positions.lock().unwrap().insert(
            symbol.to_string(),
            PositionInfo {
                symbol: symbol.to_string(),
                qty: dec(qty),
                qty_available: dec(qty_available),
                side: if dec(qty) < Decimal::ZERO { "short" } else { "long" }.to_string(),
                avg_entry_price: dec("50.00"),
            },
        );
        self
    }

    pub fn with_market_closed(self) -> Self {
        self.clock.lock().unwrap().is_open = false;
        self
    }

    /// Put the clock `minutes` before the close
    pub fn with_minutes_to_close(self, minutes: i64) -> Self {
        {
            let mut clock = self.clock.lock().unwrap();
            clock.next_close = clock.timestamp + ChronoDuration::minutes(minutes);
        }
        self
    }

    /// Create a mock whose orders are always rejected
    pub fn with_failure() -> Self {
        let mock = Self::new();
        mock.fail_orders.store(true, Ordering::SeqCst);
        mock
    }

    pub fn set_equity(&self, equity: &str) {
        self.account.lock().unwrap().equity = dec(equity);
    }

    pub fn placed_orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }

    pub fn close_all_calls(&self) -> u64 {
        self.close_all_count.load(Ordering::SeqCst)
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountGateway for MockGateway {
    fn gateway_name(&self) -> &'static str {
        "mock"
    }

    async fn account(&self) -> GatewayResult<AccountSnapshot> {
        self.account_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_account.load(Ordering::SeqCst) {
            return Err(GatewayError::Api { status: 500, body: "account unavailable".into() });
        }
        Ok(self.account.lock().unwrap().clone())
    }

    async fn clock(&self) -> GatewayResult<MarketClock> {
        Ok(self.clock.lock().unwrap().clone())
    }

    async fn last_quote(&self, symbol: &str, side: OrderSide) -> GatewayResult<f64> {
        self.quote_sides.lock().unwrap().push(side);
        self.quote
            .lock()
            .unwrap()
            .ok_or_else(|| GatewayError::InvalidResponse(format!("no quote for {}", symbol)))
    }

    async fn position(&self, symbol: &str) -> GatewayResult<Option<PositionInfo>> {
        Ok(self.positions.lock().unwrap().get(symbol).cloned())
    }

    async fn place_order(&self, order: &OrderRequest) -> GatewayResult<OrderResponse> {
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err(GatewayError::OrderRejected("mock rejection".into()));
        }
        let mut orders = self.orders.lock().unwrap();
        orders.push(order.clone());
        let response = OrderResponse {
            id: format!("order-{}", orders.len()),
            symbol: order.symbol.clone(),
            side: order.side,
            qty: Some(order.qty),
            filled_qty: order.qty,
            filled_avg_price: Some(*self.fill_price.lock().unwrap()),
            status: "filled".to_string(),
        };
        self.responses
            .lock()
            .unwrap()
            .insert(response.id.clone(), response.clone());
        Ok(response)
    }

    async fn order(&self, order_id: &str) -> GatewayResult<OrderResponse> {
        let mut response = self
            .responses
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| GatewayError::Api { status: 404, body: "order not found".into() })?;
        if !self.report_fills.load(Ordering::SeqCst) {
            response.filled_avg_price = None;
        }
        Ok(response)
    }

    async fn close_all_positions(&self, _cancel_orders: bool) -> GatewayResult<()> {
        self.close_all_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(GatewayError::Api { status: 500, body: "close failed".into() });
        }
        self.positions.lock().unwrap().clear();
        Ok(())
    }
}

/// Scorer returning a fixed score, or an error when `score` is `None`
pub struct MockScorer {
    pub score: Option<i64>,
    pub calls: Arc<AtomicU64>,
}

impl MockScorer {
    pub fn new(score: i64) -> Self {
        Self { score: Some(score), calls: Arc::new(AtomicU64::new(0)) }
    }

    pub fn failing() -> Self {
        Self { score: None, calls: Arc::new(AtomicU64::new(0)) }
    }
}

#[async_trait]
impl SentimentScorer for MockScorer {
    async fn score(&self, _headline: &str) -> ScorerResult<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.score.ok_or_else(|| ScorerError::Request("mock scorer down".into()))
    }
}
