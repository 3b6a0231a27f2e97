//! Subscriber Registry
//!
//! Tracks the cancellation handle of every live dashboard subscription,
//! keyed by connection id.

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct SubscriberRegistry {
    subscribers: Arc<DashMap<Uuid, CancellationToken>>,
    shutdown: CancellationToken,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return the token its loop must watch.
    /// After [`shutdown`](Self::shutdown) the returned token is already
    /// cancelled.
    pub fn register(&self, conn_id: Uuid) -> CancellationToken {
        let token = self.shutdown.child_token();
        self.subscribers.insert(conn_id, token.clone());
        tracing::debug!(conn_id = %conn_id, active = self.subscribers.len(), "Dashboard subscriber registered");
        token
    }

    /// Cancel and forget a connection. Returns false if it was not registered.
    pub fn remove(&self, conn_id: &Uuid) -> bool {
        match self.subscribers.remove(conn_id) {
            Some((_, token)) => {
                token.cancel();
                tracing::debug!(conn_id = %conn_id, active = self.subscribers.len(), "Dashboard subscriber removed");
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Cancel every subscription, current and future.
    pub fn shutdown(&self) {
        let active = self.subscribers.len();
        self.shutdown.cancel();
        self.subscribers.clear();
        tracing::info!(cancelled = active, "Dashboard subscriptions shut down");
    }
}
