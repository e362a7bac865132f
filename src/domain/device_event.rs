//! Device lifecycle events produced by the observer.

use super::DeviceDescriptor;

/// Event emitted by a [`crate::observer::DeviceObserver`] subscription.
///
/// [`DeviceEvent::Initial`] is sent exactly once, right after the first
/// snapshot has been taken and before any connect/disconnect event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The first snapshot was taken; polling has started.
    Initial,
    /// A device appeared since the previous snapshot.
    Connected(DeviceDescriptor),
    /// A device vanished since the previous snapshot.
    Disconnected(DeviceDescriptor),
}

impl DeviceEvent {
    /// Returns the device carried by the event, if any.
    #[must_use]
    pub const fn device(&self) -> Option<&DeviceDescriptor> {
        match self {
            Self::Initial => None,
            Self::Connected(device) | Self::Disconnected(device) => Some(device),
        }
    }

    /// Returns the event kind as a static string slice.
    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Connected(_) => "connected",
            Self::Disconnected(_) => "disconnected",
        }
    }
}
