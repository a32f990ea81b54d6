//! WebSocket streaming of simulation snapshots.
use crate::state::{AppState, StreamEvent};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

/// Handler for WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(params): Query<WsQuery>,
) -> axum::response::Response {
    let filter = params.events.as_deref().map(parse_events);
    ws.on_upgrade(move |socket| handle_socket(socket, state, filter))
        .into_response()
}

#[derive(Debug, Deserialize, Default)]
pub struct WsQuery {
    /// Comma-separated event names to receive, e.g. `tick,reset`
    events: Option<String>,
}

fn parse_events(raw: &str) -> Vec<StreamEvent> {
    raw.split(',')
        .filter_map(|name| serde_json::from_value(serde_json::Value::String(name.trim().to_string())).ok())
        .collect()
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, filter: Option<Vec<StreamEvent>>) {
    let mut rx = state.tx.subscribe();

    // Start every observer from the current state.
    let initial = serde_json::json!({ "event": "snapshot", "snapshot": state.snapshot() });
    if socket.send(Message::Text(initial.to_string())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
            event = rx.recv() => {
                match event {
                    Ok(msg) => {
                        if let Some(wanted) = filter.as_deref() {
                            if !wanted.contains(&msg.event) {
                                continue;
                            }
                        }
                        if socket.send(Message::Text(msg.payload.as_ref().to_owned())).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                        // Drop missed updates; a newer snapshot will arrive soon.
                        continue;
                    }
                    Err(_) => break,
                }
            }
        }
    }
}
