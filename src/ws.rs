//! Live session updates for display clients (scoreboard, projector).
//!
//! Every connection receives a `welcome` snapshot, then a `session` message
//! whenever a command changes the game. Clients may send the same commands
//! as `POST /api/session`.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::protocol::{SessionCommand, ServerMessage};
use crate::state::AppState;

pub const PROTOCOL_VERSION: &str = "1.0";

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before taking the snapshot so no update falls in between
    let mut broadcast_rx = state.broadcast.subscribe();

    let welcome = ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        session: state.get_session_view().await,
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    if let Ok(json) = serde_json::to_string(&welcome) {
        if sender.send(Message::Text(json.into())).await.is_err() {
            tracing::error!("Failed to send welcome message");
            return;
        }
    }

    loop {
        tokio::select! {
            update = broadcast_rx.recv() => {
                let session = match update {
                    Ok(view) => view,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Display client lagged by {} updates, resyncing", skipped);
                        state.get_session_view().await
                    }
                    Err(RecvError::Closed) => break,
                };
                if let Ok(json) = serde_json::to_string(&ServerMessage::Session { session }) {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);
                        if let Some(response) = handle_text(&text, &state).await {
                            if let Ok(json) = serde_json::to_string(&response) {
                                if sender.send(Message::Text(json.into())).await.is_err() {
                                    tracing::error!("Failed to send response");
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed");
}

/// Parse and apply one client frame. Successful commands reach the client
/// through the broadcast, so only failures produce a direct reply.
pub async fn handle_text(text: &str, state: &AppState) -> Option<ServerMessage> {
    let cmd = match serde_json::from_str::<SessionCommand>(text) {
        Ok(cmd) => cmd,
        Err(e) => {
            tracing::error!("Failed to parse client message: {}", e);
            return Some(ServerMessage::Error {
                code: "PARSE_ERROR".to_string(),
                msg: format!("Invalid message format: {}", e),
            });
        }
    };

    match state.apply_command(cmd).await {
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Command rejected: {}", e);
            Some(ServerMessage::Error {
                code: "PRECONDITION".to_string(),
                msg: e.to_string(),
            })
        }
    }
}
