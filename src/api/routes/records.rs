//! Record Routes
//!
//! - GET /api/records?status= - List records, optionally by status
//! - POST /api/records - Add a record
//! - PUT /api/records/:id - Edit name and role
//! - DELETE /api/records/:id - Delete every record with the id
//! - GET /api/records/export - Whole table as CSV

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{DeleteResponse, RecordListParams, RecordListResponse, RecordRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::dashboard::export_filename;
use crate::records::{Record, StatusFilter};

fn validate(req: &RecordRequest) -> ApiResult<()> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".to_string()));
    }
    if req.role.trim().is_empty() {
        return Err(ApiError::Validation("role must not be empty".to_string()));
    }
    Ok(())
}

/// GET /api/records
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecordListParams>,
) -> ApiResult<Json<RecordListResponse>> {
    let filter: StatusFilter = params.status.as_deref().unwrap_or("All").parse()?;
    let records = state.records.read().await.filter(filter);
    let total = records.len();

    Ok(Json(RecordListResponse { records, total }))
}

/// POST /api/records
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecordRequest>,
) -> ApiResult<(StatusCode, Json<Record>)> {
    validate(&req)?;
    let record = state.records.write().await.add(req.name, req.role);
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/records/:id
pub async fn update_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<RecordRequest>,
) -> ApiResult<Json<Record>> {
    validate(&req)?;
    let record = state.records.write().await.edit(id, req.name, req.role)?;
    Ok(Json(record))
}

/// DELETE /api/records/:id
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Json<DeleteResponse>> {
    let removed = state.records.write().await.delete(id);
    if removed == 0 {
        return Err(ApiError::NotFound(format!("Record {} not found", id)));
    }
    Ok(Json(DeleteResponse { removed }))
}

/// GET /api/records/export
pub async fn export_records(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let body = state.records.read().await.to_csv()?;
    let filename = export_filename("data", "csv");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        Body::from(body),
    )
        .into_response())
}
