//! Configuration types for the trading session
//!
//! This module defines the structs loaded from YAML. Every section and
//! field has a default, so a minimal file only needs what differs.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::adapters::alpaca::DEFAULT_DATA_FEED;
use crate::adapters::openai::DEFAULT_MODEL;
use crate::core::tasks::{QueuePriority, TaskOptions};
use crate::core::types::RiskTier;
use crate::error::AppError;

use super::constants;

/// Upper bound on task redeliveries accepted from config
pub const MAX_TASK_RETRY: u32 = 25;

// ============================================================================
// Configuration Structs
// ============================================================================

/// Trading session settings, fixed for the process lifetime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Aggressiveness tier driving thresholds and sizing
    #[serde(default = "default_risk")]
    pub risk: RiskTier,
    /// Equity gain (USD) over the starting equity that ends the session
    #[serde(default = "default_gain_target")]
    pub gain_target: Decimal,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            risk: default_risk(),
            gain_target: default_gain_target(),
        }
    }
}

fn default_risk() -> RiskTier {
    RiskTier::Medium
}

fn default_gain_target() -> Decimal {
    Decimal::from(100)
}

/// News stream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "constants::news_stream_url")]
    pub url: String,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "constants::stream_max_incomplete_reads")]
    pub max_incomplete_reads: u32,
    #[serde(default = "constants::stream_max_buffer_bytes")]
    pub max_buffer_bytes: usize,
}

impl StreamConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: constants::news_stream_url(),
            read_timeout_ms: default_read_timeout_ms(),
            max_incomplete_reads: constants::stream_max_incomplete_reads(),
            max_buffer_bytes: constants::stream_max_buffer_bytes(),
        }
    }
}

fn default_read_timeout_ms() -> u64 {
    constants::stream_read_timeout().as_millis() as u64
}

/// Task distribution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Delay before a task becomes visible to workers
    #[serde(default = "default_task_delay_ms")]
    pub delay_ms: u64,
    #[serde(default)]
    pub queue: QueuePriority,
    /// Redeliveries after a retryable failure
    #[serde(default = "default_max_retry")]
    pub max_retry: u32,
    /// Number of order decision workers
    #[serde(default = "constants::worker_concurrency")]
    pub concurrency: usize,
}

impl TaskConfig {
    /// Delivery options for process-order tasks
    pub fn task_options(&self) -> TaskOptions {
        TaskOptions {
            delay: Duration::from_millis(self.delay_ms),
            queue: self.queue,
            max_retry: self.max_retry,
            unique_key: None,
        }
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_task_delay_ms(),
            queue: QueuePriority::default(),
            max_retry: default_max_retry(),
            concurrency: constants::worker_concurrency(),
        }
    }
}

fn default_task_delay_ms() -> u64 {
    constants::task_delay().as_millis() as u64
}

fn default_max_retry() -> u32 {
    1
}

/// Session monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_monitor_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_closing_window_minutes")]
    pub closing_window_minutes: u64,
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn closing_window(&self) -> Duration {
        Duration::from_secs(self.closing_window_minutes * 60)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_monitor_interval_secs(),
            closing_window_minutes: default_closing_window_minutes(),
        }
    }
}

fn default_monitor_interval_secs() -> u64 {
    constants::monitor_interval().as_secs()
}

fn default_closing_window_minutes() -> u64 {
    constants::closing_window().as_secs() / 60
}

/// Sentiment scorer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self { model: default_model() }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Order execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Wait between a market order and its stop loss
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Market-data feed used for last quotes
    #[serde(default = "default_data_feed")]
    pub data_feed: String,
}

impl ExecutionConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            data_feed: default_data_feed(),
        }
    }
}

fn default_settle_delay_ms() -> u64 {
    constants::stop_loss_settle_delay().as_millis() as u64
}

fn default_data_feed() -> String {
    DEFAULT_DATA_FEED.to_string()
}

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub tasks: TaskConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl AppConfig {
    /// Validate configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        // Rule: a session needs something to aim for
        if self.session.gain_target <= Decimal::ZERO {
            return Err(AppError::Config(format!(
                "session.gain_target must be > 0 (got {})",
                self.session.gain_target
            )));
        }

        if !(self.stream.url.starts_with("wss://") || self.stream.url.starts_with("ws://")) {
            return Err(AppError::Config(format!(
                "stream.url must be a ws:// or wss:// URL (got '{}')",
                self.stream.url
            )));
        }

        if self.stream.read_timeout_ms == 0 {
            return Err(AppError::Config(
                "stream.read_timeout_ms must be > 0".to_string(),
            ));
        }

        if self.stream.max_buffer_bytes == 0 {
            return Err(AppError::Config(
                "stream.max_buffer_bytes must be > 0".to_string(),
            ));
        }

        if self.tasks.concurrency == 0 {
            return Err(AppError::Config(
                "tasks.concurrency must be at least 1".to_string(),
            ));
        }

        if self.tasks.max_retry > MAX_TASK_RETRY {
            return Err(AppError::Config(format!(
                "tasks.max_retry must be <= {} (got {})",
                MAX_TASK_RETRY, self.tasks.max_retry
            )));
        }

        if self.monitor.interval_secs == 0 {
            return Err(AppError::Config(
                "monitor.interval_secs must be > 0".to_string(),
            ));
        }

        if self.sentiment.model.trim().is_empty() {
            return Err(AppError::Config("sentiment.model cannot be empty".to_string()));
        }

        if self.execution.data_feed.trim().is_empty() {
            return Err(AppError::Config(
                "execution.data_feed cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.risk, RiskTier::Medium);
        assert_eq!(config.tasks.queue, QueuePriority::Critical);
        assert_eq!(config.tasks.max_retry, 1);
        assert_eq!(config.sentiment.model, "gpt-4-turbo-preview");
        assert_eq!(config.execution.data_feed, "iex");
    }

    #[test]
    fn test_task_options_from_config() {
        let config = TaskConfig {
            delay_ms: 1000,
            queue: QueuePriority::Default,
            max_retry: 2,
            concurrency: 1,
        };
        let options = config.task_options();
        assert_eq!(options.delay, Duration::from_secs(1));
        assert_eq!(options.queue, QueuePriority::Default);
        assert_eq!(options.max_retry, 2);
        assert!(options.unique_key.is_none());
    }

    #[test]
    fn test_rejects_non_positive_gain_target() {
        let mut config = AppConfig::default();
        config.session.gain_target = Decimal::ZERO;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gain_target"));
    }

    #[test]
    fn test_rejects_http_stream_url() {
        let mut config = AppConfig::default();
        config.stream.url = "https://stream.data.alpaca.markets/v1beta1/news".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_concurrency_and_excess_retry() {
        let mut config = AppConfig::default();
        config.tasks.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.tasks.max_retry = MAX_TASK_RETRY + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_monitor_durations() {
        let monitor = MonitorConfig { interval_secs: 30, closing_window_minutes: 15 };
        assert_eq!(monitor.interval(), Duration::from_secs(30));
        assert_eq!(monitor.closing_window(), Duration::from_secs(900));
    }
}
