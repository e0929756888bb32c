//! Project Routes
//!
//! - GET /api/projects - Every project with its team, tasks and comments
//! - GET /api/projects/:id - One project
//! - POST /api/projects - Create a project
//! - PUT /api/projects/:id - Replace a project's fields and children
//! - DELETE /api/projects/:id - Delete a project and everything it owns

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dto::MessageResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::storage::{Project, ProjectId, ProjectInput};

fn validate(input: &ProjectInput) -> ApiResult<()> {
    if input.title.trim().is_empty() {
        return Err(ApiError::Validation("title must not be empty".to_string()));
    }
    if !(0..=100).contains(&input.progress) {
        return Err(ApiError::Validation(format!(
            "progress must be between 0 and 100, got {}",
            input.progress
        )));
    }
    Ok(())
}

/// GET /api/projects
pub async fn list_projects(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.projects.list_projects()?))
}

/// GET /api/projects/:id
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.projects.get_project(id)?))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ProjectInput>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    validate(&input)?;
    let project = state.projects.create_project(&input, Utc::now())?;

    tracing::info!(project_id = project.id, title = %project.title, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT /api/projects/:id
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProjectId>,
    Json(input): Json<ProjectInput>,
) -> ApiResult<Json<Project>> {
    validate(&input)?;
    Ok(Json(state.projects.update_project(id, &input)?))
}

/// DELETE /api/projects/:id
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<MessageResponse>> {
    state.projects.delete_project(id)?;
    Ok(Json(MessageResponse {
        message: "Project deleted".to_string(),
    }))
}
