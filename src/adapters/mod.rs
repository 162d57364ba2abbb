//! External collaborators: brokerage gateway and sentiment scorer
//!
//! This module provides the trait seams (`AccountGateway`,
//! `SentimentScorer`) and their HTTP implementations for Alpaca and
//! OpenAI, plus the shared WebSocket and retry helpers.

pub mod alpaca;
pub mod errors;
pub mod openai;
pub mod shared;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types for convenience
pub use alpaca::{AlpacaConfig, AlpacaGateway};
pub use errors::{GatewayError, GatewayResult, ScorerError, ScorerResult};
pub use openai::OpenAiScorer;
pub use traits::{AccountGateway, SentimentScorer};
pub use types::{
    AccountSnapshot, MarketClock, OrderRequest, OrderResponse, OrderSide, OrderType,
    PositionInfo, TimeInForce,
};
