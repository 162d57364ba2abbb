//! Shared doubles for the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;

use news_trader::adapters::{
    AccountGateway, AccountSnapshot, GatewayError, GatewayResult, MarketClock, OrderRequest,
    OrderResponse, OrderSide, PositionInfo, ScorerError, ScorerResult, SentimentScorer,
};
use news_trader::core::{NewsMessage, RiskTier};

// =============================================================================
// Stub brokerage
// =============================================================================

/// In-memory brokerage: fills every order at `fill_price`
pub struct StubGateway {
    pub equity: Mutex<Decimal>,
    pub buying_power: Decimal,
    pub daytrade_count: i64,
    pub market_open: bool,
    pub quote: f64,
    pub fill_price: Decimal,
    pub reject_orders: bool,
    pub orders: Mutex<Vec<OrderRequest>>,
    pub responses: Mutex<HashMap<String, OrderResponse>>,
    pub close_calls: AtomicUsize,
}

impl StubGateway {
    pub fn new() -> Self {
        Self {
            equity: Mutex::new(Decimal::from(10_000)),
            buying_power: Decimal::from(20_000),
            daytrade_count: 0,
            market_open: true,
            quote: 50.0,
            fill_price: Decimal::from(50),
            reject_orders: false,
            orders: Mutex::new(Vec::new()),
            responses: Mutex::new(HashMap::new()),
            close_calls: AtomicUsize::new(0),
        }
    }

    pub fn market_closed() -> Self {
        Self { market_open: false, ..Self::new() }
    }

    pub fn rejecting() -> Self {
        Self { reject_orders: true, ..Self::new() }
    }

    pub fn placed(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountGateway for StubGateway {
    fn gateway_name(&self) -> &'static str {
        "stub"
    }

    async fn account(&self) -> GatewayResult<AccountSnapshot> {
        let equity = *self.equity.lock().unwrap();
        Ok(AccountSnapshot {
            equity,
            cash: equity,
            buying_power: self.buying_power,
            daytrading_buying_power: self.buying_power,
            daytrade_count: self.daytrade_count,
            account_blocked: false,
            trading_blocked: false,
        })
    }

    async fn clock(&self) -> GatewayResult<MarketClock> {
        let now = Utc::now();
        Ok(MarketClock {
            timestamp: now,
            is_open: self.market_open,
            next_open: now + ChronoDuration::hours(16),
            next_close: now + ChronoDuration::hours(4),
        })
    }

    async fn last_quote(&self, _symbol: &str, _side: OrderSide) -> GatewayResult<f64> {
        Ok(self.quote)
    }

    async fn position(&self, _symbol: &str) -> GatewayResult<Option<PositionInfo>> {
        Ok(None)
    }

    async fn place_order(&self, order: &OrderRequest) -> GatewayResult<OrderResponse> {
        if self.reject_orders {
            return Err(GatewayError::OrderRejected("stub rejection".into()));
        }
        let mut orders = self.orders.lock().unwrap();
        orders.push(order.clone());
        let response = OrderResponse {
            id: format!("stub-{}", orders.len()),
            symbol: order.symbol.clone(),
            side: order.side,
            qty: Some(order.qty),
            filled_qty: order.qty,
            filled_avg_price: Some(self.fill_price),
            status: "filled".to_string(),
        };
        self.responses.lock().unwrap().insert(response.id.clone(), response.clone());
        Ok(response)
    }

    async fn order(&self, order_id: &str) -> GatewayResult<OrderResponse> {
        self.responses
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| GatewayError::Api { status: 404, body: "not found".into() })
    }

    async fn close_all_positions(&self, _cancel_orders: bool) -> GatewayResult<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Stub scorer
// =============================================================================

pub struct StubScorer {
    pub score: Option<i64>,
    pub calls: AtomicUsize,
}

impl StubScorer {
    pub fn new(score: i64) -> Self {
        Self { score: Some(score), calls: AtomicUsize::new(0) }
    }

    pub fn failing() -> Self {
        Self { score: None, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl SentimentScorer for StubScorer {
    async fn score(&self, _headline: &str) -> ScorerResult<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.score.ok_or(ScorerError::EmptyResponse)
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub fn news(id: &str, headline: &str, symbols: &[&str], risk: RiskTier) -> NewsMessage {
    NewsMessage {
        id: id.to_string(),
        headline: headline.to_string(),
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        risk,
        source: None,
        created_at: None,
    }
}

/// Poll `check` until it holds, failing the test after two seconds
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached within 2s");
}
