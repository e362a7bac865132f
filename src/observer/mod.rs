//! Device change observation: sources, the polling observer and its
//! subscription handle.
//!
//! ```text
//! DeviceSource ──enumerate──▶ DeviceObserver (poll task) ──DeviceEvent──▶ Subscription
//! ```

pub mod device_observer;
pub mod source;
pub mod subscription;

pub use device_observer::{DEFAULT_POLL_INTERVAL, DeviceObserver};
pub use source::{DeviceSource, UsbDeviceSource};
pub use subscription::Subscription;
