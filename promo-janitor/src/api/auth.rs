//! Shared-secret check for the cleanup trigger

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use promo_common::secret::secrets_match;
use serde_json::json;
use tracing::warn;

use crate::AppState;

pub const SECRET_HEADER: &str = "x-cleanup-secret";

/// Reject the request unless `x-cleanup-secret` matches the configured
/// secret. An unset secret rejects everything.
pub async fn secret_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let provided = request
        .headers()
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok());

    if state.shared_secret.is_none() {
        warn!("Cleanup trigger called but no shared secret is configured");
        return Err(AuthError::Disabled);
    }
    if provided.is_none() {
        return Err(AuthError::Missing);
    }
    if !secrets_match(state.shared_secret.as_deref(), provided) {
        warn!("Cleanup trigger rejected: secret mismatch");
        return Err(AuthError::Mismatch);
    }

    Ok(next.run(request).await)
}

#[derive(Debug)]
pub enum AuthError {
    Disabled,
    Missing,
    Mismatch,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::Disabled => "Cleanup trigger is disabled".to_string(),
            AuthError::Missing => format!("Missing {} header", SECRET_HEADER),
            AuthError::Mismatch => "Invalid secret".to_string(),
        };
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
    }
}
