//! Point-in-time device inventory and the diff between two of them.
//!
//! A [`Snapshot`] behaves as a set (duplicates are dropped on
//! construction) but remembers the order in which the source reported its
//! devices, so diff output is deterministic.

use std::collections::HashSet;

use super::{DeviceDescriptor, DeviceEvent};

/// The set of devices visible at one poll tick.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    devices: Vec<DeviceDescriptor>,
    members: HashSet<DeviceDescriptor>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the device is part of this snapshot.
    #[must_use]
    pub fn contains(&self, device: &DeviceDescriptor) -> bool {
        self.members.contains(device)
    }

    /// Iterates the devices in source order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceDescriptor> {
        self.devices.iter()
    }

    /// Returns the number of distinct devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` if no device is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Computes the events that turn `self` into `next`.
    ///
    /// All disconnects (in `self` order) come before all connects (in
    /// `next` order).
    #[must_use]
    pub fn diff(&self, next: &Self) -> Vec<DeviceEvent> {
        let left = self
            .iter()
            .filter(|d| !next.contains(d))
            .cloned()
            .map(DeviceEvent::Disconnected);
        let entered = next
            .iter()
            .filter(|d| !self.contains(d))
            .cloned()
            .map(DeviceEvent::Connected);
        left.chain(entered).collect()
    }
}

impl FromIterator<DeviceDescriptor> for Snapshot {
    fn from_iter<I: IntoIterator<Item = DeviceDescriptor>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for device in iter {
            if snapshot.members.insert(device.clone()) {
                snapshot.devices.push(device);
            }
        }
        snapshot
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for Snapshot {}
