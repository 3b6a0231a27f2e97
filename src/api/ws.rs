//! Dashboard WebSocket
//!
//! Upgrades an authenticated staff request and drives one
//! [`BroadcastLoop`] per connection.

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension, State,
    },
    response::Response,
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use uuid::Uuid;

use crate::dashboard::{BroadcastLoop, PushChannel, PushError};

use super::middleware::AuthenticatedApiKey;
use super::AppState;

/// Sending half of a dashboard WebSocket
pub struct WsPushChannel {
    sink: SplitSink<WebSocket, Message>,
}

impl WsPushChannel {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl PushChannel for WsPushChannel {
    async fn send(&mut self, payload: String) -> Result<(), PushError> {
        // A failed WebSocket write leaves the socket unusable
        self.sink.send(Message::Text(payload)).await.map_err(|e| {
            tracing::debug!(error = %e, "Dashboard socket write failed");
            PushError::Closed
        })
    }

    async fn close(&mut self) {
        let _ = self.sink.send(Message::Close(None)).await;
        let _ = self.sink.close().await;
    }
}

/// GET /api/v1/dashboard/ws
pub async fn dashboard_ws(
    State(state): State<AppState>,
    Extension(api_key): Extension<AuthenticatedApiKey>,
    ws: WebSocketUpgrade,
) -> Response {
    let conn_id = Uuid::new_v4();
    tracing::info!(conn_id = %conn_id, api_key_id = %api_key.id, "Dashboard WebSocket accepted");

    ws.on_upgrade(move |socket| run_connection(socket, conn_id, state))
}

/// Serve one subscriber until either side goes away
async fn run_connection(socket: WebSocket, conn_id: Uuid, state: AppState) {
    let (sink, mut stream) = socket.split();
    let cancel = state.subscribers.register(conn_id);

    let broadcast = BroadcastLoop::new(conn_id, state.aggregator.clone(), state.broadcast.clone());
    let mut task = tokio::spawn(async move {
        let mut channel = WsPushChannel::new(sink);
        broadcast.run(&mut channel, cancel).await
    });

    let finished = tokio::select! {
        result = &mut task => Some(result),
        _ = wait_for_disconnect(&mut stream) => None,
    };

    // Cancels the loop if it is still running
    state.subscribers.remove(&conn_id);

    let result = match finished {
        Some(result) => result,
        None => task.await,
    };

    match result {
        Ok(summary) => tracing::debug!(conn_id = %conn_id, ?summary, "Dashboard connection closed"),
        Err(e) => tracing::error!(conn_id = %conn_id, error = %e, "Dashboard loop task failed"),
    }
}

/// Read and discard inbound frames until the client closes or errors
async fn wait_for_disconnect(stream: &mut SplitStream<WebSocket>) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(error = %e, "Dashboard socket read failed");
                break;
            }
        }
    }
}
