//! Session context: live connection registry plus the shared stop signal
//!
//! One lock guards both the registry and the shutdown transition, so a
//! connection cannot register after shutdown has cancelled the others.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct ConnectionEntry {
    label: String,
    token: CancellationToken,
}

pub struct SessionContext {
    connections: Mutex<HashMap<Uuid, ConnectionEntry>>,
    shutdown: CancellationToken,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, ConnectionEntry>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.connections.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a connection; its token fires on shutdown
    ///
    /// After shutdown the returned token is already cancelled.
    pub fn register(&self, label: &str) -> (Uuid, CancellationToken) {
        let mut connections = self.lock();
        let id = Uuid::new_v4();
        let token = self.shutdown.child_token();
        if self.shutdown.is_cancelled() {
            warn!(connection = %label, "[SESSION] Registering connection after shutdown");
        } else {
            connections.insert(id, ConnectionEntry { label: label.to_string(), token: token.clone() });
            debug!(connection = %label, connection_id = %id, "[SESSION] Connection registered");
        }
        (id, token)
    }

    pub fn deregister(&self, id: Uuid) {
        if let Some(entry) = self.lock().remove(&id) {
            debug!(connection = %entry.label, connection_id = %id, "[SESSION] Connection removed");
        }
    }

    /// Cancel every connection and fire the stop signal
    ///
    /// Returns false if shutdown had already happened.
    pub fn shutdown(&self) -> bool {
        let mut connections = self.lock();
        if self.shutdown.is_cancelled() {
            return false;
        }
        for (_, entry) in connections.drain() {
            entry.token.cancel();
        }
        self.shutdown.cancel();
        info!("[SESSION] Shutdown signalled");
        true
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Resolves once shutdown fires
    pub async fn cancelled(&self) {
        self.shutdown.cancelled().await
    }

    pub fn connection_count(&self) -> usize {
        self.lock().len()
    }
}
