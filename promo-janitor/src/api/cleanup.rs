//! POST /api/cleanup

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use promo_ingest::cleanup::{run_cleanup, CleanupReport};
use promo_ingest::db::runs;
use serde_json::json;
use tracing::{error, info, warn};

use crate::AppState;

/// Run one cleanup pass and return the report
pub async fn trigger_cleanup(State(state): State<AppState>) -> Result<Json<CleanupReport>, ApiError> {
    let started_at = Utc::now();
    let report = run_cleanup(&state.db, state.assets.as_ref(), state.retention_days, started_at)
        .await
        .map_err(|e| {
            error!(error = %e, "Cleanup run failed");
            ApiError::Store(e.to_string())
        })?;

    info!(
        scanned = report.scanned,
        deleted = report.deleted,
        already_absent = report.already_absent,
        failed = report.failed,
        "Cleanup triggered"
    );

    if let Err(e) = runs::record_run(&state.db, "cleanup", None, &report, started_at).await {
        warn!(error = %e, "Failed to record run log");
    }

    Ok(Json(report))
}

#[derive(Debug)]
pub enum ApiError {
    Store(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Store(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": msg })),
            )
                .into_response(),
        }
    }
}
