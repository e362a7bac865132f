//! [`MessageSink`] implementation over the write half of an axum WebSocket.

use std::fmt;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::SinkExt;
use futures_util::stream::SplitSink;

use crate::error::GatewayError;
use crate::hub::MessageSink;

/// Write half of a split WebSocket, owned by the hub once registered.
///
/// UTF-8 payloads go out as text frames, anything else as binary frames.
pub struct WsSink {
    inner: SplitSink<WebSocket, Message>,
}

impl WsSink {
    /// Wraps the write half of a WebSocket.
    #[must_use]
    pub fn new(inner: SplitSink<WebSocket, Message>) -> Self {
        Self { inner }
    }
}

impl fmt::Debug for WsSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsSink").finish_non_exhaustive()
    }
}

#[async_trait]
impl MessageSink for WsSink {
    async fn send(&mut self, payload: Bytes) -> Result<(), GatewayError> {
        let message = match String::from_utf8(payload.to_vec()) {
            Ok(text) => Message::text(text),
            Err(e) => Message::Binary(Bytes::from(e.into_bytes())),
        };
        self.inner
            .send(message)
            .await
            .map_err(|e| GatewayError::ConnectionWrite(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = SinkExt::close(&mut self.inner).await {
            tracing::debug!(error = %e, "ws close failed");
        }
    }
}
