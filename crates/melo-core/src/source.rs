// ── Device source abstraction ──
//
// `Discover` talks to the service through this trait so tests (and any
// future transport) can stand in for the HTTP client.

use std::future::Future;

use melo_api::DeviceClient;

use crate::error::CoreError;
use crate::model::Device;

/// Where device records come from and where deletes go.
pub trait DeviceSource: Send + Sync + 'static {
    /// Fetch the full device list, in service order.
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, CoreError>> + Send;

    /// Delete a device by serial. `Ok` only when the service confirmed.
    fn delete_device(&self, serial: &str) -> impl Future<Output = Result<(), CoreError>> + Send;
}

impl DeviceSource for DeviceClient {
    async fn list_devices(&self) -> Result<Vec<Device>, CoreError> {
        let raw = DeviceClient::list_devices(self).await?;
        Ok(raw.into_iter().map(Device::from).collect())
    }

    async fn delete_device(&self, serial: &str) -> Result<(), CoreError> {
        DeviceClient::delete_device(self, serial).await?;
        Ok(())
    }
}
