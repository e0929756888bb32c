//! User Routes
//!
//! - GET /api/users - List all chat users

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::chat::User;

/// GET /api/users
pub async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.chat_store.list_users()?))
}
