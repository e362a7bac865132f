//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 3002,
///     "message": "device enumeration failed: access denied",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                    |
/// |-----------|-----------------|--------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request                |
/// | 3000–3999 | Server          | 500 / 503 Service Unavailable  |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A configuration value could not be parsed or is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The device source failed to enumerate devices.
    #[error("device enumeration failed: {0}")]
    Enumeration(String),

    /// The connection hub worker is no longer running.
    #[error("connection hub unavailable")]
    HubUnavailable,

    /// Writing to a registered connection failed.
    #[error("connection write failed: {0}")]
    ConnectionWrite(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidConfig(_) => 1001,
            Self::Enumeration(_) => 3002,
            Self::HubUnavailable => 3003,
            Self::ConnectionWrite(_) => 3004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            Self::Enumeration(_) | Self::HubUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::ConnectionWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
