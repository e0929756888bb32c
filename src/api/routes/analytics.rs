//! Analytics Routes
//!
//! - GET /api/analytics?start=&end= - Snapshot filtered to a date window
//! - PUT /api/analytics - Replace the stored snapshot
//! - GET /api/analytics/export?section=&format= - Download a table section

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::analytics::{DateRange, Snapshot};
use crate::api::dto::{AnalyticsExportParams, AnalyticsQuery};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::dashboard::{export_filename, render_rows, ExportFormat};

/// GET /api/analytics
///
/// A missing bound leaves that side of the window open.
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<Snapshot>> {
    let open = DateRange::all_time();
    let range = DateRange::new(
        query.start.unwrap_or(open.start),
        query.end.unwrap_or(open.end),
    );

    Ok(Json(state.analytics.get_analytics(&range)?))
}

/// PUT /api/analytics
///
/// Last writer wins; the stored blob is replaced wholesale.
pub async fn update_analytics(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<Snapshot>,
) -> ApiResult<Json<Snapshot>> {
    Ok(Json(state.analytics.update_analytics(snapshot)?))
}

/// GET /api/analytics/export
pub async fn export_section(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyticsExportParams>,
) -> ApiResult<Response> {
    let format: ExportFormat = params.format.parse()?;
    let snapshot = state.analytics.get_analytics(&DateRange::all_time())?;

    let body = match params.section.as_str() {
        "traffic-sources" => render_rows(&snapshot.traffic_sources, format)?,
        "top-pages" => render_rows(&snapshot.top_pages, format)?,
        other => {
            return Err(ApiError::Validation(format!(
                "Unknown section '{}'. Expected traffic-sources or top-pages",
                other
            )))
        }
    };

    let filename = export_filename(&params.section, format.extension());
    tracing::info!(section = %params.section, filename = %filename, "Analytics export");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        Body::from(body),
    )
        .into_response())
}
