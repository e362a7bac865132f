//! Write side of a registered connection.

use std::fmt;

use async_trait::async_trait;
use axum::body::Bytes;

use crate::error::GatewayError;

/// Outbound half of a message-oriented connection owned by the hub.
#[async_trait]
pub trait MessageSink: Send + fmt::Debug {
    /// Writes one message.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConnectionWrite`] if the peer can no longer
    /// be written to.
    async fn send(&mut self, payload: Bytes) -> Result<(), GatewayError>;

    /// Closes the transport. Errors are ignored; the sink is discarded
    /// afterwards.
    async fn close(&mut self);
}
