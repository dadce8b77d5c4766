//! Driving port for the device provisioning protocol.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{Claims, Device, DeviceId, Error, Hostname, ProvisioningTask, TaskId};

/// A device record created together with its background staging task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledDevice {
    pub device: Device,
    pub task_id: TaskId,
}

/// Use-case port for device registration, ownership, power and deployment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceService: Send + Sync {
    /// List registered devices.
    async fn list(&self, claims: &Claims) -> Result<Vec<Device>, Error>;

    /// Fetch one registered device.
    async fn get(&self, claims: &Claims, id: DeviceId) -> Result<Device, Error>;

    /// Copy one port from the provider catalog into storage.
    async fn register(&self, claims: &Claims, port: DeviceId) -> Result<Device, Error>;

    /// Copy the whole provider catalog into storage in one batch.
    async fn register_all(&self, claims: &Claims) -> Result<Vec<Device>, Error>;

    /// Register a port and stage its boot files in the background.
    async fn create_record(
        &self,
        claims: &Claims,
        port: DeviceId,
        hostname: Option<Hostname>,
    ) -> Result<ScheduledDevice, Error>;

    /// Remove the boot files, then the record. Fails without deleting the row
    /// when the cleanup script fails.
    async fn delete_record(&self, claims: &Claims, id: DeviceId) -> Result<(), Error>;

    /// Claim an unowned device for the caller.
    async fn acquire(&self, claims: &Claims, id: DeviceId) -> Result<Device, Error>;

    /// Drop ownership of a device.
    async fn release(&self, claims: &Claims, id: DeviceId) -> Result<Device, Error>;

    /// Switch a device on through the provider.
    async fn power_on(&self, claims: &Claims, id: DeviceId) -> Result<Device, Error>;

    /// Switch a device off through the provider.
    async fn power_off(&self, claims: &Claims, id: DeviceId) -> Result<Device, Error>;

    /// Stage a deployment and power-cycle the device into it.
    async fn deploy(&self, claims: &Claims, id: DeviceId) -> Result<TaskId, Error>;

    /// Look up a background provisioning task.
    async fn task(&self, claims: &Claims, id: TaskId) -> Result<ProvisioningTask, Error>;
}
