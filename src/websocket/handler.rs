//! WebSocket Handler
//!
//! Handles `/ws/:user_id` upgrades. While the socket is open the user is
//! online; every text frame it sends is persisted and relayed to the
//! receiver if they are connected.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::api::AppState;
use crate::chat::{DeliverFrame, SendFrame, UserId, UserStatus};

/// WebSocket upgrade handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(user_id): Path<UserId>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, state))
}

fn set_presence(state: &AppState, user_id: UserId, status: UserStatus) {
    match state.chat_store.set_status(user_id, status, Utc::now()) {
        Ok(true) => {}
        Ok(false) => tracing::debug!(user_id, "Presence update for unknown user"),
        Err(e) => tracing::warn!(user_id, error = %e, "Failed to update presence"),
    }
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, user_id: UserId, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<DeliverFrame>();

    let connection_id = match state.hub.register(user_id, tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(user_id, error = %e, "Failed to register WebSocket connection");
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };
    set_presence(&state, user_id, UserStatus::Online);

    let conn_id_for_send = connection_id.clone();

    // Forward frames queued by the hub to this socket
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match serde_json::to_string(&frame) {
                Ok(text) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        tracing::debug!(
                            connection_id = %conn_id_for_send,
                            "WebSocket send failed, closing connection"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize frame");
                }
            }
        }
    });

    let state_for_recv = Arc::clone(&state);
    let conn_id_for_recv = connection_id.clone();

    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&state_for_recv, user_id, &conn_id_for_recv, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %conn_id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    // A replaced connection leaves presence to its successor
    if state.hub.unregister(user_id, &connection_id).await {
        set_presence(&state, user_id, UserStatus::Offline);
    }
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(
    state: &AppState,
    user_id: UserId,
    connection_id: &str,
    message: Message,
) -> bool {
    match message {
        Message::Text(text) => {
            match serde_json::from_str::<SendFrame>(&text) {
                Ok(frame) => relay(state, user_id, frame).await,
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        text = %text,
                        "Invalid chat frame"
                    );
                }
            }
            true
        }
        Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

/// Persist a message and push it to the receiver's live connection
async fn relay(state: &AppState, sender_id: UserId, frame: SendFrame) {
    let timestamp = Utc::now();

    if let Err(e) =
        state
            .chat_store
            .insert_message(sender_id, frame.receiver_id, &frame.content, timestamp)
    {
        tracing::warn!(
            sender_id,
            receiver_id = frame.receiver_id,
            error = %e,
            "Failed to persist message"
        );
    }

    let delivered = state
        .hub
        .send_personal(
            frame.receiver_id,
            DeliverFrame {
                sender_id,
                content: frame.content,
                timestamp,
            },
        )
        .await;

    tracing::debug!(sender_id, receiver_id = frame.receiver_id, delivered, "Message relayed");
}
