//! promo-janitor library - cleanup trigger service
//!
//! A scheduler calls `POST /api/cleanup` with the shared secret header;
//! `/health` is open.

use axum::Router;
use promo_ingest::cleanup::AssetStore;
use sqlx::SqlitePool;
use std::sync::Arc;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub assets: Arc<dyn AssetStore>,
    pub retention_days: u32,
    /// Expected `x-cleanup-secret` value. `None` rejects every trigger.
    pub shared_secret: Option<String>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        assets: Arc<dyn AssetStore>,
        retention_days: u32,
        shared_secret: Option<String>,
    ) -> Self {
        Self {
            db,
            assets,
            retention_days,
            shared_secret,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::post;

    // Protected routes (shared secret header)
    let protected = Router::new()
        .route("/api/cleanup", post(api::trigger_cleanup))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::secret_middleware,
        ));

    let public = Router::new().merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
