//! Device identity and snapshot filtering.
//!
//! [`DeviceDescriptor`] is the identifying triple for one attached device.
//! Two descriptors with the same path, vendor ID and product ID are the
//! same device for diffing purposes, even across snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifying triple for a single attached device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct DeviceDescriptor {
    /// Platform path of the device, stable for the lifetime of one
    /// physical connection.
    pub path: String,
    /// USB vendor ID.
    pub vendor_id: u16,
    /// USB product ID.
    pub product_id: u16,
}

impl DeviceDescriptor {
    /// Creates a new descriptor.
    #[must_use]
    pub fn new(path: impl Into<String>, vendor_id: u16, product_id: u16) -> Self {
        Self {
            path: path.into(),
            vendor_id,
            product_id,
        }
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:04x}:{:04x})",
            self.path, self.vendor_id, self.product_id
        )
    }
}

/// Optional vendor/product restriction applied to every snapshot.
///
/// An absent field matches any value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFilter {
    /// Only keep devices with this vendor ID.
    pub vendor_id: Option<u16>,
    /// Only keep devices with this product ID.
    pub product_id: Option<u16>,
}

impl DeviceFilter {
    /// A filter that matches every device.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            vendor_id: None,
            product_id: None,
        }
    }

    /// Restricts the filter to a vendor ID.
    #[must_use]
    pub const fn with_vendor_id(mut self, vendor_id: u16) -> Self {
        self.vendor_id = Some(vendor_id);
        self
    }

    /// Restricts the filter to a product ID.
    #[must_use]
    pub const fn with_product_id(mut self, product_id: u16) -> Self {
        self.product_id = Some(product_id);
        self
    }

    /// Returns `true` if the IDs pass the filter.
    #[must_use]
    pub fn matches_ids(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id.is_none_or(|v| v == vendor_id)
            && self.product_id.is_none_or(|p| p == product_id)
    }

    /// Returns `true` if the descriptor passes the filter.
    #[must_use]
    pub fn matches(&self, device: &DeviceDescriptor) -> bool {
        self.matches_ids(device.vendor_id, device.product_id)
    }
}
