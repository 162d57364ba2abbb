//! News ingestion session
//!
//! Connects to the news stream, checks that trading is possible, then
//! authenticates, subscribes to every symbol and turns each qualifying
//! headline into a process-order task.
//!
//! # Termination
//! - `RemoteClosed`: Close frame or end of stream
//! - `Cancelled`: the session context shut down
//! - `MarketUnavailable`: market closed or day trades exhausted at start
//! - `Err`: transport failure, feed error message, or enqueue failure

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::adapters::shared::{connect_tls, TlsWebSocketStream};
use crate::adapters::AccountGateway;
use crate::config::{BrokerCredentials, StreamConfig, TaskConfig};
use crate::core::decoder::{FeedDecoder, FeedItem};
use crate::core::session::SessionContext;
use crate::core::tasks::{Task, TaskDistributor, TaskError, TaskOptions};
use crate::core::types::{NewsMessage, RiskTier};
use crate::error::{AppError, Result};

/// Registry label for the news connection
pub const NEWS_CONNECTION_LABEL: &str = "news-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    MarketUnavailable,
    RemoteClosed,
    Cancelled,
}

/// Stream and enqueue settings for one session
#[derive(Debug, Clone)]
pub struct IngestionSettings {
    pub url: String,
    pub read_timeout: Duration,
    pub max_incomplete_reads: u32,
    pub max_buffer_bytes: usize,
    pub task_options: TaskOptions,
}

impl IngestionSettings {
    pub fn from_config(stream: &StreamConfig, tasks: &TaskConfig) -> Self {
        Self {
            url: stream.url.clone(),
            read_timeout: stream.read_timeout(),
            max_incomplete_reads: stream.max_incomplete_reads,
            max_buffer_bytes: stream.max_buffer_bytes,
            task_options: tasks.task_options(),
        }
    }
}

/// Message for a qualifying feed item: trimmed headline and at least one symbol
pub fn news_message_from_item(item: FeedItem, risk: RiskTier) -> Option<NewsMessage> {
    let headline = item.headline.as_deref().map(str::trim).unwrap_or_default();
    if headline.is_empty() {
        return None;
    }
    let symbols = item.symbols.clone().unwrap_or_default();
    if symbols.is_empty() {
        debug!(headline = %headline, "[INGEST] Headline without symbols skipped");
        return None;
    }
    let id = item.id_string().unwrap_or_else(|| Uuid::new_v4().to_string());
    Some(NewsMessage {
        id,
        headline: headline.to_string(),
        symbols,
        risk,
        source: item.source,
        created_at: item.created_at,
    })
}

pub struct NewsSession {
    settings: IngestionSettings,
    key_id: String,
    secret_key: String,
    risk: RiskTier,
    gateway: Arc<dyn AccountGateway>,
    distributor: Arc<dyn TaskDistributor>,
    context: Arc<SessionContext>,
}

impl NewsSession {
    pub fn new(
        settings: IngestionSettings,
        credentials: &BrokerCredentials,
        risk: RiskTier,
        gateway: Arc<dyn AccountGateway>,
        distributor: Arc<dyn TaskDistributor>,
        context: Arc<SessionContext>,
    ) -> Self {
        Self {
            settings,
            key_id: credentials.key_id.clone(),
            secret_key: credentials.secret_key.clone(),
            risk,
            gateway,
            distributor,
            context,
        }
    }

    /// Run until the feed closes, the context shuts down, or a fatal error
    pub async fn run(&self) -> Result<SessionEnd> {
        let stream = connect_tls(&self.settings.url).await?;
        let (connection_id, token) = self.context.register(NEWS_CONNECTION_LABEL);
        info!(url = %self.settings.url, connection_id = %connection_id, "[INGEST] Connected to news stream");

        let result = self.drive(stream, &token).await;

        self.context.deregister(connection_id);
        match &result {
            Ok(end) => info!(end = ?end, "[INGEST] News session ended"),
            Err(e) => error!(error = %e, "[INGEST] News session failed"),
        }
        result
    }

    async fn drive(
        &self,
        mut stream: TlsWebSocketStream,
        token: &CancellationToken,
    ) -> Result<SessionEnd> {
        if token.is_cancelled() {
            close_quietly(&mut stream).await;
            return Ok(SessionEnd::Cancelled);
        }

        match self.ready_to_trade().await {
            Ok(true) => {}
            Ok(false) => {
                close_quietly(&mut stream).await;
                return Ok(SessionEnd::MarketUnavailable);
            }
            Err(e) => {
                close_quietly(&mut stream).await;
                return Err(e);
            }
        }

        self.subscribe(&mut stream).await?;

        let mut decoder =
            FeedDecoder::new(self.settings.max_incomplete_reads, self.settings.max_buffer_bytes);
        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                next = tokio::time::timeout(self.settings.read_timeout, stream.next()) => Some(next),
            };
            let Some(next) = next else {
                info!("[INGEST] Stop signal received, closing news stream");
                close_quietly(&mut stream).await;
                return Ok(SessionEnd::Cancelled);
            };

            let message = match next {
                // Read timeout: poll the stop signal again
                Err(_) => continue,
                Ok(None) => return Ok(SessionEnd::RemoteClosed),
                Ok(Some(Err(e))) => return Err(e.into()),
                Ok(Some(Ok(message))) => message,
            };

            match message {
                Message::Text(text) => self.handle_bytes(&mut decoder, text.as_bytes()).await?,
                Message::Binary(data) => self.handle_bytes(&mut decoder, &data).await?,
                Message::Close(frame) => {
                    info!(frame = ?frame, "[INGEST] News stream closed by remote");
                    return Ok(SessionEnd::RemoteClosed);
                }
                _ => {}
            }
        }
    }

    async fn ready_to_trade(&self) -> Result<bool> {
        if !self.gateway.is_market_open().await? {
            info!("[INGEST] Market is closed, not subscribing");
            return Ok(false);
        }
        if !self.gateway.have_trades().await? {
            info!("[INGEST] No day trades left, not subscribing");
            return Ok(false);
        }
        Ok(true)
    }

    async fn subscribe(&self, stream: &mut TlsWebSocketStream) -> Result<()> {
        let auth = json!({
            "action": "auth",
            "key": self.key_id,
            "secret": self.secret_key,
        });
        stream.send(Message::Text(auth.to_string())).await?;

        let subscribe = json!({ "action": "subscribe", "news": ["*"] });
        stream.send(Message::Text(subscribe.to_string())).await?;
        info!("[INGEST] Subscribed to all news");
        Ok(())
    }

    async fn handle_bytes(&self, decoder: &mut FeedDecoder, bytes: &[u8]) -> Result<()> {
        for item in decoder.push(bytes) {
            if item.is_error() {
                return Err(AppError::Api(format!(
                    "news feed error {}: {}",
                    item.code.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string()),
                    item.msg.as_deref().unwrap_or("unknown")
                )));
            }
            if item.headline.is_none() {
                if let Some(kind) = item.kind.as_deref() {
                    info!(kind = %kind, msg = ?item.msg, "[INGEST] Feed control message");
                }
                continue;
            }
            if let Some(message) = news_message_from_item(item, self.risk) {
                self.distribute(message).await?;
            }
        }
        Ok(())
    }

    async fn distribute(&self, message: NewsMessage) -> Result<()> {
        let task = Task::process_order(&message, self.settings.task_options.clone())?;
        match self.distributor.enqueue(task).await {
            Ok(info) => {
                info!(
                    task_id = %info.id,
                    queue = info.queue.as_str(),
                    message_id = %message.id,
                    symbols = ?message.symbols,
                    headline = %message.headline,
                    "[INGEST] Task enqueued"
                );
                Ok(())
            }
            Err(TaskError::Conflict(key)) => {
                debug!(key = %key, "[INGEST] Duplicate news item skipped");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, message_id = %message.id, "[INGEST] unable to distribute task");
                Err(e.into())
            }
        }
    }
}

async fn close_quietly(stream: &mut TlsWebSocketStream) {
    if let Err(e) = stream.close(None).await {
        warn!(error = %e, "[INGEST] Error closing news stream");
    }
}
