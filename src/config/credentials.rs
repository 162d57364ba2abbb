//! Credentials and endpoints from environment variables
//!
//! Brokerage and sentiment credentials are required. The broker-connection
//! settings (`REDIS_ADDR`, `DB_PASSWORD`) are optional: they only matter for
//! an external task broker, the in-process broker ignores them.

use thiserror::Error;
use tracing::{debug, info};

use super::logging::SanitizedValue;

pub const DEFAULT_TRADING_URL: &str = "https://paper-api.alpaca.markets";
pub const DEFAULT_DATA_URL: &str = "https://data.alpaca.markets";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// Errors for environment-based configuration
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid URL in {var}: {value}")]
    InvalidUrl { var: String, value: String },
}

fn required(var: &str) -> Result<String, CredentialsError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(CredentialsError::MissingEnvVar(var.to_string())),
    }
}

fn url_or_default(var: &str, default: &str) -> Result<String, CredentialsError> {
    let value = std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string());
    if !(value.starts_with("https://") || value.starts_with("http://")) {
        return Err(CredentialsError::InvalidUrl { var: var.to_string(), value });
    }
    Ok(value.trim_end_matches('/').to_string())
}

/// Alpaca API credentials and endpoints
#[derive(Debug, Clone)]
pub struct BrokerCredentials {
    pub key_id: String,
    pub secret_key: String,
    pub trading_url: String,
    pub data_url: String,
}

impl BrokerCredentials {
    /// Required: `APCA_API_KEY_ID`, `APCA_API_SECRET_KEY`
    ///
    /// Optional: `APCA_API_BASE_URL` (paper trading by default), `APCA_DATA_URL`
    pub fn from_env() -> Result<Self, CredentialsError> {
        let key_id = required("APCA_API_KEY_ID")?;
        let secret_key = required("APCA_API_SECRET_KEY")?;
        let trading_url = url_or_default("APCA_API_BASE_URL", DEFAULT_TRADING_URL)?;
        let data_url = url_or_default("APCA_DATA_URL", DEFAULT_DATA_URL)?;

        info!(
            key_id = %SanitizedValue::new(&key_id),
            trading_url = %trading_url,
            data_url = %data_url,
            "Brokerage credentials loaded"
        );

        Ok(Self { key_id, secret_key, trading_url, data_url })
    }
}

/// OpenAI credentials
#[derive(Debug, Clone)]
pub struct SentimentCredentials {
    pub api_key: String,
    pub base_url: String,
}

impl SentimentCredentials {
    /// Required: `OPEN_AI_KEY`. Optional: `OPENAI_BASE_URL`
    pub fn from_env() -> Result<Self, CredentialsError> {
        let api_key = required("OPEN_AI_KEY")?;
        let base_url = url_or_default("OPENAI_BASE_URL", DEFAULT_OPENAI_URL)?;
        info!(api_key = %SanitizedValue::new(&api_key), "Sentiment credentials loaded");
        Ok(Self { api_key, base_url })
    }
}

/// External broker connection settings
#[derive(Debug, Clone, Default)]
pub struct BrokerConnection {
    pub addr: Option<String>,
    pub password: Option<String>,
}

impl BrokerConnection {
    /// Optional: `REDIS_ADDR`, `DB_PASSWORD`
    pub fn from_env() -> Self {
        let addr = std::env::var("REDIS_ADDR").ok().filter(|v| !v.is_empty());
        let password = std::env::var("DB_PASSWORD").ok().filter(|v| !v.is_empty());
        if addr.is_some() {
            debug!(addr = ?addr, "External broker address set but the in-process broker is used");
        }
        Self { addr, password }
    }
}

impl std::fmt::Display for BrokerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.addr, &self.password) {
            (None, _) => write!(f, "in-process"),
            (Some(addr), None) => write!(f, "{} (unused, in-process broker active)", addr),
            (Some(addr), Some(password)) => write!(
                f,
                "{} password={} (unused, in-process broker active)",
                addr,
                SanitizedValue::new(password)
            ),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
