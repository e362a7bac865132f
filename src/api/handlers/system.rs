//! System endpoints: health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::HealthResponse;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /health` — Service health status.
///
/// # Errors
///
/// Returns [`GatewayError::HubUnavailable`] if the connection hub stopped.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp and the number of connected listeners.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Connection hub stopped", body = ErrorResponse),
    )
)]
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let connections = state.hub.connection_count().await?;
    Ok((
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            connections,
        }),
    ))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
