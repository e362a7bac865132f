//! HTTP application assembly.
//!
//! Routes:
//!
//! - `/api/v1/*`, `/health`: REST endpoints ([`crate::api`])
//! - `/ws`: WebSocket upgrade ([`crate::ws`])
//! - `/static/*`: files from the configured static directory
//! - anything else: the configured index page

use std::path::Path;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the complete router with all layers applied.
pub fn build_app(state: AppState, static_dir: &Path, index_file: &Path) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback_service(ServeFile::new(index_file))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
