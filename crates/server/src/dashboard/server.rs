//! Metrics endpoint and live WebSocket feed.
//!
//! `/metrics` returns one snapshot; `/ws` pushes a metrics snapshot every
//! 200 ms and every world change as it happens.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::broadcast::error::RecvError;

use super::metrics::MetricsSnapshot;
use crate::api::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/ws", get(ws_upgrade))
}

fn snapshot(state: &AppState) -> MetricsSnapshot {
    state
        .dashboard
        .metrics
        .snapshot(state.game.world().slot_count() as u64)
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(snapshot(&state))
}

/// Upgrade an HTTP request to a WebSocket connection.
async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Push metrics and world changes to a connected client.
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut changes_rx = state.dashboard.subscribe_changes();
    let mut ticker = tokio::time::interval(Duration::from_millis(200));

    loop {
        tokio::select! {
            // Push metrics every 200 ms.
            _ = ticker.tick() => {
                let msg = serde_json::json!({
                    "type": "metrics",
                    "data": snapshot(&state),
                });
                if send_json(&mut socket, &msg).await.is_err() {
                    break;
                }
            }

            // Push each world change batch as it arrives.
            result = changes_rx.recv() => {
                let batch = match result {
                    Ok(batch) => batch,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Live feed lagged, skipped {} batches", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let msg = serde_json::json!({
                    "type": "changes",
                    "data": batch.to_message(),
                });
                if send_json(&mut socket, &msg).await.is_err() {
                    break;
                }
            }

            // Drain any incoming messages (ping/pong, close).
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {} // ignore pings, text, etc.
                }
            }
        }
    }
}

async fn send_json(socket: &mut WebSocket, value: &serde_json::Value) -> Result<(), ()> {
    let text = value.to_string();
    socket.send(Message::Text(text.into())).await.map_err(|_| ())
}
