//! Message Routes
//!
//! - GET /api/users/:user_id/messages?other_user_id= - Conversation history
//! - POST /api/messages/mark-read - Read receipt

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{MessagesQuery, StatusResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::chat::{HistoryMessage, MarkReadRequest, UserId};

/// GET /api/users/:user_id/messages
///
/// Messages between the two users in either direction, oldest first.
pub async fn conversation(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
    Query(query): Query<MessagesQuery>,
) -> ApiResult<Json<Vec<HistoryMessage>>> {
    let Some(other_user_id) = query.other_user_id else {
        return Ok(Json(Vec::new()));
    };

    let messages = state.chat_store.conversation(user_id, other_user_id)?;
    tracing::debug!(user_id, other_user_id, count = messages.len(), "History served");
    Ok(Json(messages))
}

/// POST /api/messages/mark-read
///
/// Marks unread messages from `sender_id` to `user_id` as read.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MarkReadRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let updated = state.chat_store.mark_read(req.user_id, req.sender_id)?;
    tracing::debug!(
        user_id = req.user_id,
        sender_id = req.sender_id,
        updated,
        "Messages marked read"
    );
    Ok(Json(StatusResponse::success()))
}
