//! WebSocket handler for client connections
//!
//! Handles token authentication, WebSocket upgrade, connection lifecycle,
//! and message forwarding.

use axum::extract::ws::{Message, WebSocket};
use axum::{
    extract::{Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::channels::{ChannelRegistry, Subscription};
use super::messages::{self, WsMessage};
use crate::gateway::state::AppState;

/// WebSocket connection query parameters
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// WebSocket upgrade handler
///
/// Endpoint: GET /ws?token=<jwt>. The channel is private, so the upgrade is
/// refused unless the token verifies.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let user_id = match state.auth.verify_token(&params.token) {
        Ok(claims) => match claims.sub.parse::<i64>() {
            Ok(id) => id,
            Err(_) => return StatusCode::UNAUTHORIZED.into_response(),
        },
        Err(_) => return StatusCode::UNAUTHORIZED.into_response(),
    };

    let channels = state.channels.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, channels))
}

/// Handle WebSocket connection lifecycle
async fn handle_socket(socket: WebSocket, user_id: i64, channels: Arc<ChannelRegistry>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    // Dropping this at the end of the function detaches the socket.
    let _subscription = Subscription::attach(channels, user_id, tx.clone());

    // Send welcome message
    let welcome = WsMessage::Connected {
        channel: messages::channel(user_id),
    };
    if let Ok(json) = serde_json::to_string(&welcome) {
        let _ = sender.send(Message::Text(json.into())).await;
    }

    // Forward messages from channel to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages (ping/pong, close)
    let tx_for_recv = tx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if text.contains("\"type\"") && text.contains("\"ping\"") {
                        let _ = tx_for_recv.send(WsMessage::Pong);
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }
}
