//! Device inventory handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::DeviceListResponse;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /devices` — Devices visible right now.
///
/// Takes a fresh, filtered snapshot; independent of the running
/// subscription.
///
/// # Errors
///
/// Returns [`GatewayError::Enumeration`] if the device source fails.
#[utoipa::path(
    get,
    path = "/api/v1/devices",
    tag = "Devices",
    summary = "List attached devices",
    description = "Enumerates the devices that pass the configured vendor/product filter.",
    responses(
        (status = 200, description = "Current device list", body = DeviceListResponse),
        (status = 503, description = "Device enumeration failed", body = ErrorResponse),
    )
)]
pub async fn list_devices(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let snapshot = state.observer.snapshot().await?;
    let response = DeviceListResponse::from_snapshot(&snapshot, state.observer.filter());
    Ok((StatusCode::OK, Json(response)))
}

/// Device routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/devices", get(list_devices))
}
