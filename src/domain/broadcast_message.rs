//! JSON envelope broadcast to WebSocket listeners.
//!
//! Wire shape: `{"data": <string>, "type": <string>}`, one object per
//! transport message. The hub itself never looks inside the payload.

use axum::body::Bytes;
use serde::{Deserialize, Serialize};

use super::DeviceEvent;

/// `type` value used for messages relayed from a WebSocket client.
pub const RELAY_MESSAGE_TYPE: &str = "message";

/// Envelope carried by every broadcast frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    /// Message body.
    pub data: String,
    /// Message type discriminator, interpreted by the page.
    #[serde(rename = "type")]
    pub msg_type: String,
}

impl BroadcastMessage {
    /// Creates a new envelope.
    #[must_use]
    pub fn new(data: impl Into<String>, msg_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            msg_type: msg_type.into(),
        }
    }

    /// Wraps a message received from a client for re-broadcast.
    #[must_use]
    pub fn relay(data: impl Into<String>) -> Self {
        Self::new(data, RELAY_MESSAGE_TYPE)
    }

    /// Maps a device event onto the envelope the page understands.
    ///
    /// Returns `None` for [`DeviceEvent::Initial`], which is not broadcast.
    #[must_use]
    pub fn for_event(event: &DeviceEvent) -> Option<Self> {
        match event {
            DeviceEvent::Initial => None,
            DeviceEvent::Connected(_) => Some(Self::new("Connect", "popUp")),
            DeviceEvent::Disconnected(_) => Some(Self::new("Disconnect", "popOut")),
        }
    }

    /// Serializes the envelope into a broadcast payload.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_payload(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }
}
