//! Registry of live outbound connections with best-effort fan-out.
//!
//! [`ConnectionHub`] is a cheap, cloneable handle. The registry itself is
//! owned by a single worker task, and every register, unregister and
//! publish request is a command processed in arrival order. No lock is
//! ever held while a write is in flight.
//!
//! The command queue is bounded: once it is full, callers wait for the
//! worker to catch up instead of buffering without limit.

use std::collections::HashMap;
use std::time::Duration;

use axum::body::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::{ConnectionId, MessageSink};
use crate::error::GatewayError;

/// Upper bound for a single connection write when none is configured.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Number of queued hub commands when none is configured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1_024;

#[derive(Debug)]
enum HubCommand {
    Register {
        id: ConnectionId,
        connection: Registration,
    },
    Unregister {
        id: ConnectionId,
    },
    Publish {
        payload: Bytes,
    },
    ListConnections {
        reply: oneshot::Sender<Vec<ConnectionId>>,
    },
}

/// A registered sink and the token cancelled when it leaves the hub.
#[derive(Debug)]
struct Registration {
    sink: Box<dyn MessageSink>,
    closed: CancellationToken,
}

/// Handle to the connection registry.
///
/// The worker stops, closing every remaining connection, once all handles
/// have been dropped.
#[derive(Debug, Clone)]
pub struct ConnectionHub {
    commands: mpsc::Sender<HubCommand>,
}

impl ConnectionHub {
    /// Spawns the hub worker with [`DEFAULT_QUEUE_CAPACITY`].
    ///
    /// `write_timeout` bounds every individual write and close; a
    /// connection that does not accept a message in time counts as failed.
    #[must_use]
    pub fn spawn(write_timeout: Duration) -> Self {
        Self::spawn_with_capacity(write_timeout, DEFAULT_QUEUE_CAPACITY)
    }

    /// Spawns the hub worker with room for `queue_capacity` pending
    /// commands (at least one).
    #[must_use]
    pub fn spawn_with_capacity(write_timeout: Duration, queue_capacity: usize) -> Self {
        let (commands, rx) = mpsc::channel(queue_capacity.max(1));
        let worker = HubWorker {
            connections: HashMap::new(),
            write_timeout,
        };
        tokio::spawn(worker.run(rx));
        Self { commands }
    }

    /// Adds a connection to the broadcast set.
    ///
    /// `closed` is cancelled as soon as the hub drops the connection, for
    /// whatever reason, so the owner can stop reading from it. Registering
    /// an id twice replaces (and closes) the earlier sink.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::HubUnavailable`] if the worker has stopped.
    pub async fn register(
        &self,
        id: ConnectionId,
        sink: Box<dyn MessageSink>,
        closed: CancellationToken,
    ) -> Result<(), GatewayError> {
        let connection = Registration { sink, closed };
        self.commands
            .send(HubCommand::Register { id, connection })
            .await
            .map_err(|_| GatewayError::HubUnavailable)
    }

    /// Removes a connection if it is still registered.
    pub async fn unregister(&self, id: ConnectionId) {
        if self.commands.send(HubCommand::Unregister { id }).await.is_err() {
            tracing::debug!(connection_id = %id, "hub stopped before unregister");
        }
    }

    /// Delivers `payload` to every registered connection.
    ///
    /// Waits only for room in the command queue. Connections whose write
    /// fails are closed and dropped, and nothing is reported back to the
    /// caller.
    pub async fn publish(&self, payload: Bytes) {
        if self.commands.send(HubCommand::Publish { payload }).await.is_err() {
            tracing::debug!("hub stopped, broadcast dropped");
        }
    }

    /// Returns the ids currently eligible for broadcast.
    ///
    /// The answer reflects every command sent from this task before the
    /// call.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::HubUnavailable`] if the worker has stopped.
    pub async fn connection_ids(&self) -> Result<Vec<ConnectionId>, GatewayError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(HubCommand::ListConnections { reply })
            .await
            .map_err(|_| GatewayError::HubUnavailable)?;
        rx.await.map_err(|_| GatewayError::HubUnavailable)
    }

    /// Returns the number of registered connections.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::HubUnavailable`] if the worker has stopped.
    pub async fn connection_count(&self) -> Result<usize, GatewayError> {
        Ok(self.connection_ids().await?.len())
    }
}

/// Single owner of the registry.
struct HubWorker {
    connections: HashMap<ConnectionId, Registration>,
    write_timeout: Duration,
}

impl HubWorker {
    async fn run(mut self, mut commands: mpsc::Receiver<HubCommand>) {
        while let Some(command) = commands.recv().await {
            match command {
                HubCommand::Register { id, connection } => self.register(id, connection).await,
                HubCommand::Unregister { id } => self.unregister(id).await,
                HubCommand::Publish { payload } => self.publish(&payload).await,
                HubCommand::ListConnections { reply } => {
                    let _ = reply.send(self.connections.keys().copied().collect());
                }
            }
        }

        let timeout = self.write_timeout;
        for (id, connection) in self.connections.drain() {
            tracing::debug!(connection_id = %id, "closing connection on hub shutdown");
            close_connection(id, connection, timeout).await;
        }
    }

    async fn register(&mut self, id: ConnectionId, connection: Registration) {
        if let Some(previous) = self.connections.insert(id, connection) {
            tracing::warn!(connection_id = %id, "connection registered twice, replacing");
            close_connection(id, previous, self.write_timeout).await;
        }
        tracing::info!(
            connection_id = %id,
            connections = self.connections.len(),
            "connection registered"
        );
    }

    async fn unregister(&mut self, id: ConnectionId) {
        if let Some(connection) = self.connections.remove(&id) {
            close_connection(id, connection, self.write_timeout).await;
            tracing::info!(
                connection_id = %id,
                connections = self.connections.len(),
                "connection unregistered"
            );
        }
    }

    async fn publish(&mut self, payload: &Bytes) {
        let mut failed = Vec::new();

        for (id, connection) in &mut self.connections {
            let write = connection.sink.send(payload.clone());
            match tokio::time::timeout(self.write_timeout, write).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(connection_id = %id, error = %e, "broadcast write failed");
                    failed.push(*id);
                }
                Err(_) => {
                    tracing::warn!(connection_id = %id, "broadcast write timed out");
                    failed.push(*id);
                }
            }
        }

        for id in failed {
            self.unregister(id).await;
        }
    }
}

/// Signals the owner, then closes the sink within `timeout`. A sink that
/// does not close in time is dropped as is.
async fn close_connection(id: ConnectionId, connection: Registration, timeout: Duration) {
    let Registration { mut sink, closed } = connection;
    closed.cancel();
    if tokio::time::timeout(timeout, sink.close()).await.is_err() {
        tracing::warn!(connection_id = %id, "connection close timed out, dropping it");
    }
}
