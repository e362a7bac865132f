//! Shared application state injected into all Axum handlers.

use tokio_util::sync::CancellationToken;

use crate::hub::ConnectionHub;
use crate::observer::DeviceObserver;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Registry of connected WebSocket listeners.
    pub hub: ConnectionHub,
    /// Observer configuration, used for on-demand snapshots.
    pub observer: DeviceObserver,
    /// Process-wide shutdown signal; connection tasks use child tokens.
    pub shutdown: CancellationToken,
}
