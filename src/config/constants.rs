//! Application constants and configuration defaults
//!
//! Timing values used as defaults by the YAML config. Each can be
//! overridden via an environment variable.

use std::time::Duration;

// =============================================================================
// News Stream
// =============================================================================

/// Default news stream endpoint
pub const DEFAULT_NEWS_STREAM_URL: &str = "wss://stream.data.alpaca.markets/v1beta1/news";

/// News stream URL
///
/// Environment variable: `NEWS_STREAM_URL`
pub fn news_stream_url() -> String {
    std::env::var("NEWS_STREAM_URL").unwrap_or_else(|_| DEFAULT_NEWS_STREAM_URL.to_string())
}

/// Bounded wait per read on the news stream (default: 2000ms)
///
/// Environment variable: `STREAM_READ_TIMEOUT_MS`
pub fn stream_read_timeout() -> Duration {
    let ms = std::env::var("STREAM_READ_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2000);
    Duration::from_millis(ms)
}

/// Consecutive incomplete decodes before the buffer is dropped (default: 16)
///
/// Environment variable: `STREAM_MAX_INCOMPLETE_READS`
pub fn stream_max_incomplete_reads() -> u32 {
    std::env::var("STREAM_MAX_INCOMPLETE_READS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(16)
}

/// Accumulation buffer limit in bytes (default: 1 MiB)
///
/// Environment variable: `STREAM_MAX_BUFFER_BYTES`
pub fn stream_max_buffer_bytes() -> usize {
    std::env::var("STREAM_MAX_BUFFER_BYTES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1024 * 1024)
}

// =============================================================================
// Tasks & Execution
// =============================================================================

/// Delay before an enqueued task becomes visible (default: 1000ms)
///
/// Environment variable: `TASK_DELAY_MS`
pub fn task_delay() -> Duration {
    let ms = std::env::var("TASK_DELAY_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);
    Duration::from_millis(ms)
}

/// Order decision workers drawing from the task broker (default: 4)
///
/// Environment variable: `WORKER_CONCURRENCY`
pub fn worker_concurrency() -> usize {
    std::env::var("WORKER_CONCURRENCY")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(4)
}

/// Wait between a market order and its stop loss (default: 3000ms)
///
/// Environment variable: `STOP_LOSS_SETTLE_MS`
pub fn stop_loss_settle_delay() -> Duration {
    let ms = std::env::var("STOP_LOSS_SETTLE_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3000);
    Duration::from_millis(ms)
}

// =============================================================================
// Session Monitor
// =============================================================================

/// Session monitor tick interval (default: 30 seconds)
///
/// Environment variable: `MONITOR_INTERVAL_SECS`
pub fn monitor_interval() -> Duration {
    let secs = std::env::var("MONITOR_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);
    Duration::from_secs(secs)
}

/// Positions are closed once the market is this close to the bell (default: 15 minutes)
///
/// Environment variable: `CLOSING_WINDOW_MINUTES`
pub fn closing_window() -> Duration {
    let minutes = std::env::var("CLOSING_WINDOW_MINUTES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(15);
    Duration::from_secs(minutes * 60)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Print all configuration values (for debugging/startup logs)
pub fn log_configuration() {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("News stream:");
    tracing::info!("  - URL: {}", news_stream_url());
    tracing::info!("  - Read timeout: {:?}", stream_read_timeout());
    tracing::info!("  - Max incomplete reads: {}", stream_max_incomplete_reads());
    tracing::info!("  - Max buffer bytes: {}", stream_max_buffer_bytes());

    tracing::info!("Execution:");
    tracing::info!("  - Task delay: {:?}", task_delay());
    tracing::info!("  - Worker concurrency: {}", worker_concurrency());
    tracing::info!("  - Stop loss settle delay: {:?}", stop_loss_settle_delay());

    tracing::info!("Monitor:");
    tracing::info!("  - Interval: {:?}", monitor_interval());
    tracing::info!("  - Closing window: {:?}", closing_window());
    tracing::info!("==================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial(env)]
    fn test_default_values() {
        assert_eq!(news_stream_url(), DEFAULT_NEWS_STREAM_URL);
        assert_eq!(stream_read_timeout(), Duration::from_secs(2));
        assert_eq!(monitor_interval(), Duration::from_secs(30));
        assert_eq!(closing_window(), Duration::from_secs(15 * 60));
        assert_eq!(stop_loss_settle_delay(), Duration::from_secs(3));
        assert_eq!(task_delay(), Duration::from_secs(1));
        assert_eq!(worker_concurrency(), 4);
    }

    #[test]
    #[serial(env)]
    fn test_env_override() {
        std::env::set_var("MONITOR_INTERVAL_SECS", "5");
        std::env::set_var("CLOSING_WINDOW_MINUTES", "20");

        assert_eq!(monitor_interval(), Duration::from_secs(5));
        assert_eq!(closing_window(), Duration::from_secs(20 * 60));

        std::env::remove_var("MONITOR_INTERVAL_SECS");
        std::env::remove_var("CLOSING_WINDOW_MINUTES");
    }

    #[test]
    #[serial(env)]
    fn test_unparseable_override_falls_back() {
        std::env::set_var("STREAM_READ_TIMEOUT_MS", "soon");
        assert_eq!(stream_read_timeout(), Duration::from_millis(2000));
        std::env::remove_var("STREAM_READ_TIMEOUT_MS");
    }
}
