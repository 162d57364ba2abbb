//! Logging configuration
//!
//! Provides configurable JSON/Pretty logging output and a redacting
//! wrapper for credentials.
//!
//! # Environment Variables
//! - `LOG_FORMAT`: Output format - `json` (default) or `pretty`
//! - `RUST_LOG`: Log level filter (default: `info`)

use std::fmt;

use tracing_subscriber::EnvFilter;

/// Initialize logging with configurable format
///
/// Reads `LOG_FORMAT` from environment:
/// - `json` (default): Machine-parseable JSON output for production
/// - `pretty`: Human-readable output for development
pub fn init_logging() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if log_format == "pretty" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .pretty()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    }
}

/// Wrapper for sensitive data that should be redacted in logs.
///
/// ```rust,ignore
/// let api_key = "sk-1234567890abcdef";
/// tracing::info!(api_key = %SanitizedValue::new(api_key), "Scorer ready");
/// // Output: api_key = "sk-1...REDACTED"
/// ```
#[derive(Clone)]
pub struct SanitizedValue<'a>(&'a str);

impl<'a> SanitizedValue<'a> {
    pub fn new(value: &'a str) -> Self {
        Self(value)
    }
}

impl<'a> fmt::Display for SanitizedValue<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get(..4) {
            // Show first 4 chars for longer values
            Some(prefix) if self.0.len() > 8 => write!(f, "{}...REDACTED", prefix),
            _ => write!(f, "REDACTED"),
        }
    }
}

impl<'a> fmt::Debug for SanitizedValue<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SanitizedValue(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_value_shows_prefix() {
        assert_eq!(SanitizedValue::new("sk-1234567890abcdef").to_string(), "sk-1...REDACTED");
    }

    #[test]
    fn test_short_value_fully_redacted() {
        assert_eq!(SanitizedValue::new("abc").to_string(), "REDACTED");
        assert_eq!(SanitizedValue::new("").to_string(), "REDACTED");
    }

    #[test]
    fn test_debug_never_leaks() {
        let debug = format!("{:?}", SanitizedValue::new("PKSECRET123456789"));
        assert!(!debug.contains("PKSECRET"));
    }

    #[test]
    fn test_multibyte_prefix_does_not_panic() {
        // byte 4 falls inside the second 'é'
        let value = "aééééé";
        assert_eq!(SanitizedValue::new(value).to_string(), "REDACTED");
    }
}
