//! Adapter error types
//!
//! Brokerage failures are wrapped in GatewayError, LLM failures in
//! ScorerError. Both implement thiserror for consistent handling.

use thiserror::Error;

use super::types::HTTP_TIMEOUT_SECS;

/// Brokerage-specific error types for gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Connection to the brokerage or feed failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Credentials were rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Network operation timed out
    #[error("Network timeout after {0}ms")]
    NetworkTimeout(u64),

    /// Invalid or unexpected response body
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Order refused by the brokerage (403/422)
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// Any other non-success HTTP status
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// WebSocket protocol error (boxed to reduce enum size)
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
}

impl GatewayError {
    /// Whether an idempotent request may be retried after this error
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::ConnectionFailed(_) | GatewayError::NetworkTimeout(_) => true,
            GatewayError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::NetworkTimeout(HTTP_TIMEOUT_SECS * 1000)
        } else if e.is_decode() {
            GatewayError::InvalidResponse(e.to_string())
        } else {
            GatewayError::ConnectionFailed(e.to_string())
        }
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Sentiment scorer failures
#[derive(Error, Debug)]
pub enum ScorerError {
    #[error("Sentiment request failed: {0}")]
    Request(String),

    #[error("Sentiment API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Sentiment response had no choices")]
    EmptyResponse,

    #[error("Sentiment response is not a whole number: {0:?}")]
    NotANumber(String),
}

impl From<reqwest::Error> for ScorerError {
    fn from(e: reqwest::Error) -> Self {
        ScorerError::Request(e.to_string())
    }
}

/// Result type alias for scorer operations
pub type ScorerResult<T> = std::result::Result<T, ScorerError>;
