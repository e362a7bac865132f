//! System endpoint DTOs.

use serde::Serialize;
use utoipa::ToSchema;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` when the endpoint answers.
    pub status: String,
    /// RFC 3339 timestamp of the check.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
    /// Number of WebSocket listeners currently registered.
    pub connections: usize,
}
