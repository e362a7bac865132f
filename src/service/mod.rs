//! Service layer: background tasks that connect the observer to the hub.

pub mod device_relay;

pub use device_relay::{relay_event, run_device_relay};
