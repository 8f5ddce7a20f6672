//! Health check endpoint
//!
//! Open to the scheduler without the secret header. Reports whether the
//! store answers and whether cleanup triggers can be accepted at all.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database does not answer
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub database: bool,
    /// False when no shared secret is configured and every trigger is refused
    pub accepts_triggers: bool,
    pub retention_days: u32,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "Health check could not reach database");
            false
        }
    };

    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        module: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        database,
        accepts_triggers: state.shared_secret.is_some(),
        retention_days: state.retention_days,
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
