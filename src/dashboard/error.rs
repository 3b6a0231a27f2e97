//! Dashboard Errors
//!
//! Error types for dashboard reads and snapshot delivery.

use std::time::Duration;

/// Errors that can occur while reading the dashboard view
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The read did not finish within the configured bound
    #[error("Dashboard read timed out after {0:?}")]
    Timeout(Duration),

    /// A stored row violates a domain invariant
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Check if this error is likely to clear up on the next tick
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Database(_) | StoreError::Timeout(_))
    }
}

/// Errors that can occur when pushing a snapshot to a subscriber
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The subscriber has gone away; nothing more can be sent
    #[error("Push channel closed")]
    Closed,

    /// The payload could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport-level failure that did not close the channel
    #[error("Transport error: {0}")]
    Transport(String),
}

impl PushError {
    /// Check if the channel can no longer be used
    pub fn is_closed(&self) -> bool {
        matches!(self, PushError::Closed)
    }
}
