//! Domain layer: device identity, snapshots, events and the broadcast
//! envelope.
//!
//! This module contains the pure data model shared by the observer, the
//! relay and the WebSocket layer. Nothing here performs I/O.

pub mod broadcast_message;
pub mod device;
pub mod device_event;
pub mod snapshot;

pub use broadcast_message::BroadcastMessage;
pub use device::{DeviceDescriptor, DeviceFilter};
pub use device_event::DeviceEvent;
pub use snapshot::Snapshot;
