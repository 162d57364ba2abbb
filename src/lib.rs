//! News Sentiment Trader
//!
//! Streams market news, scores each headline with an LLM and turns
//! high-confidence scores into sized brokerage orders:
//! - Account gateway (Alpaca REST) and sentiment scorer (OpenAI)
//! - In-process priority task broker between ingestion and execution
//! - Session monitor enforcing gain target, PDT and closing-time stops

pub mod adapters;
pub mod config;
pub mod core;
pub mod error;

pub use error::AppError;
