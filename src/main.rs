//! News Trader - Entry Point
//!
//! 1. Loads `.env`, logging and the YAML configuration
//! 2. Builds the brokerage gateway, sentiment scorer and task broker
//! 3. Snapshots starting equity for the gain target
//! 4. Runs the worker pool, session monitor and news ingestion until the
//!    session ends or SIGINT/SIGTERM arrives

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use news_trader::adapters::{AccountGateway, AlpacaConfig, AlpacaGateway, OpenAiScorer};
use news_trader::config::{
    self, constants, BrokerConnection, BrokerCredentials, SanitizedValue, SentimentCredentials,
};
use news_trader::core::{
    run_session, IngestionSettings, MemoryBroker, NewsSession, OrderDecisionWorker,
    OrderExecutor, SessionContext, SessionMonitor, SessionOptions, TaskProcessor,
    TASK_PROCESS_ORDER,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenvy::dotenv().ok();
    config::init_logging();
    constants::log_configuration();

    let config_path =
        PathBuf::from(std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string()));
    info!(path = %config_path.display(), "[CONFIG] Loading configuration");
    let app_config = config::load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    info!(
        risk = %app_config.session.risk,
        gain_target = %app_config.session.gain_target,
        concurrency = app_config.tasks.concurrency,
        "[CONFIG] Configuration loaded"
    );

    let broker_credentials = BrokerCredentials::from_env()?;
    let sentiment_credentials = SentimentCredentials::from_env()?;
    let broker_connection = BrokerConnection::from_env();
    info!(
        key_id = %SanitizedValue::new(&broker_credentials.key_id),
        trading_url = %broker_credentials.trading_url,
        task_broker = %broker_connection,
        "[CONFIG] Brokerage credentials loaded"
    );

    let gateway: Arc<dyn AccountGateway> = Arc::new(AlpacaGateway::new(
        AlpacaConfig::from_credentials(&broker_credentials, &app_config.execution.data_feed),
    ));
    let scorer = Arc::new(OpenAiScorer::new(
        &sentiment_credentials.base_url,
        &sentiment_credentials.api_key,
        &app_config.sentiment.model,
    ));
    let broker = Arc::new(MemoryBroker::new());
    let context = Arc::new(SessionContext::new());

    let starting_equity = gateway.equity().await.context("fetching starting equity")?;
    let options = SessionOptions::new(
        app_config.session.risk,
        app_config.session.gain_target,
        starting_equity,
    );
    info!(
        starting_equity = %starting_equity,
        target_equity = %options.target_equity(),
        "[CONFIG] Session options set"
    );

    let executor = OrderExecutor::new(gateway.clone(), app_config.execution.settle_delay());
    let worker = Arc::new(OrderDecisionWorker::new(scorer, executor));
    let processor = TaskProcessor::new(broker.clone(), app_config.tasks.concurrency)
        .handle(TASK_PROCESS_ORDER, worker);

    let monitor = SessionMonitor::new(
        gateway.clone(),
        context.clone(),
        options.clone(),
        app_config.monitor.interval(),
        app_config.monitor.closing_window(),
    );

    let session = NewsSession::new(
        IngestionSettings::from_config(&app_config.stream, &app_config.tasks),
        &broker_credentials,
        options.risk(),
        gateway,
        broker.clone(),
        context.clone(),
    );

    let signal_context = context.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("[SHUTDOWN] Graceful shutdown initiated");
        signal_context.shutdown();
    });

    let result = run_session(session, monitor, processor, context).await;
    broker.close().await;
    let stats = broker.stats().await;
    info!(
        completed = stats.completed,
        archived = stats.archived,
        pending = stats.pending,
        "[SHUTDOWN] Task broker drained"
    );

    match result {
        Ok(end) => {
            info!(end = ?end, "[SHUTDOWN] Session complete");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "[SHUTDOWN] Session failed");
            Err(e.into())
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            error!(error = %e, "[SHUTDOWN] Failed to install SIGTERM handler");
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "[SHUTDOWN] Failed to listen for Ctrl+C");
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "[SHUTDOWN] Failed to listen for Ctrl+C");
    }
}
