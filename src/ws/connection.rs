//! Per-connection reader task.
//!
//! The write half of every upgraded socket is handed to the
//! [`ConnectionHub`]; this task keeps the read half and republishes each
//! inbound message to every listener. The task ends on close frame, read
//! error, end of stream, process shutdown or when the hub drops the
//! connection, and always unregisters its connection on the way out.

use axum::extract::ws::{Message, WebSocket};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use super::sink::WsSink;
use crate::domain::BroadcastMessage;
use crate::hub::{ConnectionHub, ConnectionId};

/// Registers the socket with the hub and runs its read loop.
pub async fn run_connection(socket: WebSocket, hub: ConnectionHub, shutdown: CancellationToken) {
    let id = ConnectionId::new();
    let (ws_tx, mut ws_rx) = socket.split();
    let closed = shutdown.child_token();

    if let Err(e) = hub
        .register(id, Box::new(WsSink::new(ws_tx)), closed.clone())
        .await
    {
        tracing::warn!(connection_id = %id, error = %e, "could not register ws connection");
        return;
    }

    loop {
        tokio::select! {
            biased;
            () = closed.cancelled() => break,
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => relay(&hub, id, text.as_str()).await,
                    Some(Ok(Message::Binary(bytes))) => {
                        relay(&hub, id, &String::from_utf8_lossy(&bytes)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %id, error = %e, "ws read failed");
                        break;
                    }
                }
            }
        }
    }

    hub.unregister(id).await;
    tracing::debug!(connection_id = %id, "ws connection closed");
}

/// Wraps an inbound message in the broadcast envelope and publishes it.
async fn relay(hub: &ConnectionHub, id: ConnectionId, text: &str) {
    match BroadcastMessage::relay(text).to_payload() {
        Ok(payload) => hub.publish(payload).await,
        Err(e) => {
            tracing::warn!(connection_id = %id, error = %e, "could not encode relayed message");
        }
    }
}
