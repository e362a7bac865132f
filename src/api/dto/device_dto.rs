//! Device listing DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{DeviceDescriptor, DeviceFilter, Snapshot};

/// Filter currently applied by the observer. `null` means "any".
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeviceFilterDto {
    /// Vendor ID restriction.
    pub vendor_id: Option<u16>,
    /// Product ID restriction.
    pub product_id: Option<u16>,
}

impl From<DeviceFilter> for DeviceFilterDto {
    fn from(filter: DeviceFilter) -> Self {
        Self {
            vendor_id: filter.vendor_id,
            product_id: filter.product_id,
        }
    }
}

/// Response body of `GET /api/v1/devices`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeviceListResponse {
    /// Devices visible right now, in enumeration order.
    pub devices: Vec<DeviceDescriptor>,
    /// Number of devices.
    pub count: usize,
    /// Filter the list was taken with.
    pub filter: DeviceFilterDto,
}

impl DeviceListResponse {
    /// Builds the response from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot, filter: DeviceFilter) -> Self {
        let devices: Vec<DeviceDescriptor> = snapshot.iter().cloned().collect();
        Self {
            count: devices.len(),
            devices,
            filter: filter.into(),
        }
    }
}
