//! Application-wide error types using thiserror
//!
//! Session-level failures (ingestion, monitor, startup) are wrapped in
//! AppError. Task-level failures use `ProcessError` instead so the
//! broker can decide on redelivery.

use thiserror::Error;

use crate::adapters::errors::{GatewayError, ScorerError};
use crate::core::tasks::TaskError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Scorer error: {0}")]
    Scorer(#[from] ScorerError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for AppError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        AppError::WebSocket(Box::new(e))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
