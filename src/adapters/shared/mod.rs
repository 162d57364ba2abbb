//! Shared adapter infrastructure
//!
//! Connection and retry helpers used by the brokerage gateway, the
//! sentiment scorer and the news stream.

pub mod retry;
pub mod websocket;

pub use retry::{retry_with_backoff, BackoffConfig};
pub use websocket::{connect_tls, TlsWebSocketStream};
