//! Status endpoints

use axum::{Json, Router, extract::State, routing::get};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{StatsResponse, StatusResponse};

/// GET /api/v1/status
async fn status() -> Json<StatusResponse> {
    metrics::counter!("turnstile_status_checks_total").increment(1);

    Json(StatusResponse {
        status: "OK".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/v1/stats
async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let users = state.db.count_users().await?;
    Ok(Json(StatsResponse { users }))
}

/// GET /api/v1/unauthorized - always rejects, for exercising client error handling
async fn unauthorized() -> ApiError {
    ApiError::Unauthorized("Unauthorized".to_string())
}

/// GET /api/v1/forbidden - always rejects, for exercising client error handling
async fn forbidden() -> ApiError {
    ApiError::Forbidden
}

/// Create status routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/status", get(status))
        .route("/api/v1/stats", get(stats))
        .route("/api/v1/unauthorized", get(unauthorized))
        .route("/api/v1/forbidden", get(forbidden))
}
