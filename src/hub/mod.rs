//! Broadcast hub: the registry of live outbound connections.
//!
//! Connections enter the hub through [`ConnectionHub::register`] and leave
//! it either explicitly or the first time a write to them fails.

pub mod connection_hub;
pub mod connection_id;
pub mod sink;

pub use connection_hub::{ConnectionHub, DEFAULT_QUEUE_CAPACITY, DEFAULT_WRITE_TIMEOUT};
pub use connection_id::ConnectionId;
pub use sink::MessageSink;
