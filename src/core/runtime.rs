//! Session runtime
//!
//! Wires the three long-running units together: the worker pool and the
//! monitor run in background tasks while ingestion runs in the caller.
//! Whichever unit ends first fires the shared shutdown.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::core::ingestion::{NewsSession, SessionEnd};
use crate::core::monitor::SessionMonitor;
use crate::core::session::SessionContext;
use crate::core::tasks::TaskProcessor;
use crate::error::{AppError, Result};

/// Run one trading session to completion
///
/// An ingestion error takes precedence over a monitor error.
pub async fn run_session(
    session: NewsSession,
    monitor: SessionMonitor,
    processor: TaskProcessor,
    context: Arc<SessionContext>,
) -> Result<SessionEnd> {
    let workers = tokio::spawn(processor.run(context.shutdown_token()));
    let monitor_handle = tokio::spawn(async move { monitor.run().await });

    let ingestion = session.run().await;
    if context.shutdown() {
        info!("[RUNTIME] Ingestion ended, shutting down session");
    }

    let monitor_result = match monitor_handle.await {
        Ok(Ok(reason)) => {
            info!(reason = ?reason, "[RUNTIME] Monitor stopped");
            Ok(())
        }
        Ok(Err(e)) => {
            error!(error = %e, "[RUNTIME] Monitor failed");
            Err(AppError::Gateway(e))
        }
        Err(e) => {
            error!(error = %e, "[RUNTIME] Monitor task panicked");
            Err(AppError::Api(format!("monitor task failed: {}", e)))
        }
    };

    if let Err(e) = workers.await {
        warn!(error = %e, "[RUNTIME] Worker pool task failed");
    }
    info!("[RUNTIME] Session finished");

    let end = ingestion?;
    monitor_result?;
    Ok(end)
}
