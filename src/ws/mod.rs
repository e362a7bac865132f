//! WebSocket layer: upgrade, connection registration and inbound relay.
//!
//! The WebSocket endpoint at `/ws` registers every client with the
//! [`crate::hub::ConnectionHub`]. Anything a client sends is broadcast to
//! all clients, device events included.

pub mod connection;
pub mod handler;
pub mod sink;
