//! Dashboard Broadcast Loop
//!
//! One loop per subscriber: compute a snapshot, send it, wait, repeat.
//!
//! ```text
//! Idle -> Computing -> Sending -> Waiting(interval) -> Computing ...
//!              \           \
//!               +-> Error <-+ -> Waiting(error_backoff) -> Computing ...
//! any state -> Closed   (cancellation, or the channel went away)
//! ```
//!
//! Failures never end the loop; only cancellation or a closed channel does.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::aggregator::Aggregator;
use super::error::{PushError, StoreError};

/// Upper bound on closing the channel once the loop has ended
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Where a subscriber's loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Computing,
    Sending,
    Waiting(Duration),
    Error,
    Closed,
}

/// Timing of the broadcast loop
#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    /// Wait after a successful send (default: 10 seconds)
    pub interval: Duration,
    /// Wait after a failed tick (default: 5 seconds)
    pub error_backoff: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            error_backoff: Duration::from_secs(5),
        }
    }
}

/// Outbound half of a subscriber connection
#[async_trait]
pub trait PushChannel: Send {
    /// Deliver one serialized snapshot.
    async fn send(&mut self, payload: String) -> Result<(), PushError>;

    /// Close the channel; errors are ignored since the peer may be gone.
    async fn close(&mut self);
}

/// Why a tick produced nothing
#[derive(Debug, thiserror::Error)]
enum TickError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Push(#[from] PushError),
}

impl TickError {
    fn is_transient(&self) -> bool {
        match self {
            TickError::Store(e) => e.is_transient(),
            TickError::Push(_) => true,
        }
    }
}

/// Counters reported when a loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastSummary {
    pub ticks: u64,
    pub sent: u64,
    pub failures: u64,
}

/// Periodic compute-and-send loop for one subscriber
pub struct BroadcastLoop {
    conn_id: Uuid,
    aggregator: Aggregator,
    config: BroadcastConfig,
    state: LoopState,
    summary: BroadcastSummary,
}

impl BroadcastLoop {
    pub fn new(conn_id: Uuid, aggregator: Aggregator, config: BroadcastConfig) -> Self {
        Self {
            conn_id,
            aggregator,
            config,
            state: LoopState::Idle,
            summary: BroadcastSummary::default(),
        }
    }

    fn enter(&mut self, state: LoopState) {
        tracing::trace!(conn_id = %self.conn_id, from = ?self.state, to = ?state, "Dashboard loop transition");
        self.state = state;
    }

    fn fail(&mut self, error: TickError) -> Duration {
        self.enter(LoopState::Error);
        self.summary.failures += 1;
        let retry_in_ms = self.config.error_backoff.as_millis() as u64;
        if error.is_transient() {
            tracing::warn!(conn_id = %self.conn_id, error = %error, retry_in_ms, "Dashboard tick failed");
        } else {
            tracing::error!(conn_id = %self.conn_id, error = %error, retry_in_ms, "Dashboard tick failed");
        }
        self.config.error_backoff
    }

    /// Run until `cancel` fires or the channel closes, then close the channel.
    pub async fn run<C: PushChannel + ?Sized>(
        mut self,
        channel: &mut C,
        cancel: CancellationToken,
    ) -> BroadcastSummary {
        tracing::info!(conn_id = %self.conn_id, "Dashboard subscription started");

        loop {
            self.enter(LoopState::Computing);
            self.summary.ticks += 1;

            let computed = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.aggregator.compute_snapshot() => result,
            };

            let payload = computed.map_err(TickError::from).and_then(|snapshot| {
                serde_json::to_string(&snapshot).map_err(|e| TickError::from(PushError::from(e)))
            });

            let wait = match payload {
                Ok(payload) => {
                    // A snapshot computed after cancellation is dropped, not sent
                    if cancel.is_cancelled() {
                        break;
                    }
                    self.enter(LoopState::Sending);
                    // A peer that stops reading must not pin the loop here
                    let sent = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        result = channel.send(payload) => result,
                    };
                    match sent {
                        Ok(()) => {
                            self.summary.sent += 1;
                            self.config.interval
                        }
                        Err(e) if e.is_closed() => {
                            tracing::debug!(conn_id = %self.conn_id, "Push channel closed by peer");
                            break;
                        }
                        Err(e) => self.fail(e.into()),
                    }
                }
                Err(e) => self.fail(e),
            };

            self.enter(LoopState::Waiting(wait));
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        self.enter(LoopState::Closed);
        if tokio::time::timeout(CLOSE_TIMEOUT, channel.close()).await.is_err() {
            tracing::debug!(conn_id = %self.conn_id, "Push channel close timed out");
        }

        tracing::info!(
            conn_id = %self.conn_id,
            ticks = self.summary.ticks,
            sent = self.summary.sent,
            failures = self.summary.failures,
            "Dashboard subscription ended"
        );

        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_config_default() {
        let config = BroadcastConfig::default();
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.error_backoff, Duration::from_secs(5));
    }

    #[test]
    fn test_broadcast_summary_default() {
        let summary = BroadcastSummary::default();
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.sent, 0);
        assert_eq!(summary.failures, 0);
    }
}
