//! Configuration module for session settings and YAML loading
//!
//! This module provides:
//! - Configuration types (`AppConfig` and its sections)
//! - YAML loading functionality (`load_config`)
//! - Environment credentials (`BrokerCredentials`, `SentimentCredentials`)
//! - Application constants with environment variable overrides
//! - Logging initialization

pub mod constants;
pub mod credentials;
pub mod logging;
mod loader;
mod types;

// Re-export types
pub use types::{
    AppConfig, ExecutionConfig, MonitorConfig, SentimentConfig, SessionConfig, StreamConfig,
    TaskConfig, MAX_TASK_RETRY,
};

// Re-export credentials
pub use credentials::{BrokerConnection, BrokerCredentials, CredentialsError, SentimentCredentials};

// Re-export loader functions
pub use loader::{load_config, load_config_from_str};

pub use logging::{init_logging, SanitizedValue};
