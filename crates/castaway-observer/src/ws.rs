//! `WebSocket` stream of tick summaries.
//!
//! Clients connect to `GET /ws/ticks` and receive one JSON
//! [`TickBroadcast`] text frame per completed tick. A client that falls
//! behind skips the ticks it missed and resumes from the newest.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::{AppState, TickBroadcast};

/// Upgrade the request and start streaming.
pub async fn ws_ticks(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_ticks(socket, state))
}

/// What to do after handling one event on the socket.
enum Flow {
    Continue,
    Close,
}

async fn stream_ticks(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");
    let mut rx = state.subscribe();

    loop {
        let flow = tokio::select! {
            received = rx.recv() => match received {
                Ok(tick) => forward(&mut socket, &tick).await,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "WebSocket client lagged, skipping ahead");
                    Flow::Continue
                }
                Err(RecvError::Closed) => Flow::Close,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_ok() {
                        Flow::Continue
                    } else {
                        Flow::Close
                    }
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => Flow::Close,
                Some(Ok(_)) => Flow::Continue,
            },
        };

        if matches!(flow, Flow::Close) {
            debug!("WebSocket client disconnected");
            return;
        }
    }
}

async fn forward(socket: &mut WebSocket, tick: &TickBroadcast) -> Flow {
    let json = match serde_json::to_string(tick) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, tick = tick.tick, "Failed to serialize tick broadcast");
            return Flow::Continue;
        }
    };
    if socket.send(Message::Text(json.into())).await.is_ok() {
        Flow::Continue
    } else {
        Flow::Close
    }
}
