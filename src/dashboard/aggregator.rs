//! Dashboard Aggregator
//!
//! Binds a [`DashboardSource`] to the pure snapshot builder and bounds each
//! read with a timeout.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::error::StoreError;
use super::snapshot::Snapshot;
use super::source::DashboardSource;

/// Computes snapshots from an injected read-only source
#[derive(Clone)]
pub struct Aggregator {
    source: Arc<dyn DashboardSource>,
    read_timeout: Duration,
}

impl Aggregator {
    pub fn new(source: Arc<dyn DashboardSource>, read_timeout: Duration) -> Self {
        Self {
            source,
            read_timeout,
        }
    }

    /// Compute the snapshot for the current instant.
    pub async fn compute_snapshot(&self) -> Result<Snapshot, StoreError> {
        self.compute_snapshot_at(Utc::now()).await
    }

    /// Compute the snapshot as of `now`; "today" is `now`'s UTC date.
    pub async fn compute_snapshot_at(&self, now: DateTime<Utc>) -> Result<Snapshot, StoreError> {
        let view = tokio::time::timeout(self.read_timeout, self.source.read_view(now.date_naive()))
            .await
            .map_err(|_| StoreError::Timeout(self.read_timeout))??;

        Ok(Snapshot::from_view(&view, now))
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}
