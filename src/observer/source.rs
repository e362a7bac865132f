//! Device snapshot sources.
//!
//! [`DeviceSource`] is the seam between the observer and the platform's
//! device enumeration. [`UsbDeviceSource`] is the production implementation
//! backed by `nusb`.

use std::fmt;

use async_trait::async_trait;
use nusb::MaybeFuture;

use crate::domain::{DeviceDescriptor, DeviceFilter};
use crate::error::GatewayError;

/// Lists the devices currently visible to the host.
///
/// Called once per poll tick, so implementations must be cheap to call
/// repeatedly.
#[async_trait]
pub trait DeviceSource: Send + Sync + fmt::Debug {
    /// Returns the devices that pass `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Enumeration`] if the platform could not be
    /// queried.
    async fn enumerate(
        &self,
        filter: &DeviceFilter,
    ) -> Result<Vec<DeviceDescriptor>, GatewayError>;
}

/// Enumerates USB devices through `nusb`.
///
/// The listing runs on the blocking pool since some platforms query the
/// OS synchronously.
#[derive(Debug, Default, Clone, Copy)]
pub struct UsbDeviceSource;

impl UsbDeviceSource {
    /// Creates a new USB source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeviceSource for UsbDeviceSource {
    async fn enumerate(
        &self,
        filter: &DeviceFilter,
    ) -> Result<Vec<DeviceDescriptor>, GatewayError> {
        let filter = *filter;
        tokio::task::spawn_blocking(move || list_usb_devices(&filter))
            .await
            .map_err(|e| GatewayError::Enumeration(format!("enumeration task failed: {e}")))?
    }
}

fn list_usb_devices(filter: &DeviceFilter) -> Result<Vec<DeviceDescriptor>, GatewayError> {
    let devices = nusb::list_devices()
        .wait()
        .map_err(|e| GatewayError::Enumeration(e.to_string()))?;

    Ok(devices
        .filter(|info| filter.matches_ids(info.vendor_id(), info.product_id()))
        .map(|info| {
            DeviceDescriptor::new(
                format!("{}-{}", info.bus_id(), info.device_address()),
                info.vendor_id(),
                info.product_id(),
            )
        })
        .collect())
}
