//! Alpaca brokerage gateway
//!
//! REST implementation of `AccountGateway` against the Alpaca trading API
//! (`/v2/account`, `/v2/clock`, `/v2/positions`, `/v2/orders`) and the
//! market-data snapshot endpoint for last quotes.
//!
//! Idempotent GETs are retried with backoff on timeouts, 429 and 5xx.
//! Order placement and position closing are sent once.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::adapters::errors::{GatewayError, GatewayResult};
use crate::adapters::shared::{retry_with_backoff, BackoffConfig};
use crate::adapters::traits::AccountGateway;
use crate::adapters::types::{
    create_http_client, AccountSnapshot, MarketClock, OrderRequest, OrderResponse, OrderSide,
    PositionInfo,
};
use crate::config::BrokerCredentials;

// =============================================================================
// Configuration
// =============================================================================

/// Default market-data feed for snapshots (real-time IEX)
pub const DEFAULT_DATA_FEED: &str = "iex";

/// Alpaca connection settings
#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    pub trading_url: String,
    pub data_url: String,
    pub key_id: String,
    pub secret_key: String,
    pub data_feed: String,
}

impl AlpacaConfig {
    pub fn from_credentials(credentials: &BrokerCredentials, data_feed: &str) -> Self {
        Self {
            trading_url: credentials.trading_url.trim_end_matches('/').to_string(),
            data_url: credentials.data_url.trim_end_matches('/').to_string(),
            key_id: credentials.key_id.clone(),
            secret_key: credentials.secret_key.clone(),
            data_feed: data_feed.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(rename = "latestQuote")]
    latest_quote: Option<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(rename = "ap", default)]
    ask_price: f64,
    #[serde(rename = "bp", default)]
    bid_price: f64,
}

// =============================================================================
// Gateway
// =============================================================================

pub struct AlpacaGateway {
    client: reqwest::Client,
    config: AlpacaConfig,
    backoff: BackoffConfig,
}

impl AlpacaGateway {
    pub fn new(config: AlpacaConfig) -> Self {
        Self {
            client: create_http_client("alpaca"),
            config,
            backoff: BackoffConfig::default(),
        }
    }

    /// Override the retry schedule for idempotent requests
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("APCA-API-KEY-ID", &self.config.key_id)
            .header("APCA-API-SECRET-KEY", &self.config.secret_key)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> GatewayResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => GatewayError::AuthenticationFailed(body),
                code => GatewayError::Api { status: code, body },
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> GatewayResult<T> {
        retry_with_backoff(&self.backoff, url, GatewayError::is_retryable, || async move {
            let response = self.authed(self.client.get(url)).send().await?;
            Self::decode(response).await
        })
        .await
    }
}

#[async_trait]
impl AccountGateway for AlpacaGateway {
    fn gateway_name(&self) -> &'static str {
        "alpaca"
    }

    async fn account(&self) -> GatewayResult<AccountSnapshot> {
        self.get_json(&format!("{}/v2/account", self.config.trading_url))
            .await
    }

    async fn clock(&self) -> GatewayResult<MarketClock> {
        self.get_json(&format!("{}/v2/clock", self.config.trading_url))
            .await
    }

    async fn last_quote(&self, symbol: &str, side: OrderSide) -> GatewayResult<f64> {
        let url = format!(
            "{}/v2/stocks/{}/snapshot?feed={}",
            self.config.data_url, symbol, self.config.data_feed
        );
        let snapshot: Snapshot = self.get_json(&url).await?;
        let quote = snapshot.latest_quote.ok_or_else(|| {
            GatewayError::InvalidResponse(format!("snapshot for {} has no latest quote", symbol))
        })?;
        let price = match side {
            OrderSide::Buy => quote.ask_price,
            OrderSide::Sell => quote.bid_price,
        };
        debug!(symbol = %symbol, side = %side, price, "[GATEWAY] Last quote");
        Ok(price)
    }

    async fn position(&self, symbol: &str) -> GatewayResult<Option<PositionInfo>> {
        let url = format!("{}/v2/positions/{}", self.config.trading_url, symbol);
        match self.get_json::<PositionInfo>(&url).await {
            Ok(position) => Ok(Some(position)),
            Err(GatewayError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn place_order(&self, order: &OrderRequest) -> GatewayResult<OrderResponse> {
        let url = format!("{}/v2/orders", self.config.trading_url);
        let response = self
            .authed(self.client.post(&url))
            .json(order)
            .send()
            .await?;
        match Self::decode::<OrderResponse>(response).await {
            Ok(placed) => {
                info!(
                    order_id = %placed.id,
                    symbol = %placed.symbol,
                    side = %placed.side,
                    qty = %order.qty,
                    order_type = ?order.order_type,
                    status = %placed.status,
                    "[TRADE] Order accepted"
                );
                Ok(placed)
            }
            Err(GatewayError::Api { status: 403 | 422, body }) => {
                warn!(symbol = %order.symbol, body = %body, "[TRADE] Order rejected");
                Err(GatewayError::OrderRejected(body))
            }
            Err(e) => Err(e),
        }
    }

    async fn order(&self, order_id: &str) -> GatewayResult<OrderResponse> {
        self.get_json(&format!("{}/v2/orders/{}", self.config.trading_url, order_id))
            .await
    }

    async fn close_all_positions(&self, cancel_orders: bool) -> GatewayResult<()> {
        let url = format!(
            "{}/v2/positions?cancel_orders={}",
            self.config.trading_url, cancel_orders
        );
        let response = self.authed(self.client.delete(&url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api { status: status.as_u16(), body });
        }
        info!(cancel_orders, "[TRADE] Closed all positions");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
