//! Port for the remote provider that lists devices and switches their power.

use async_trait::async_trait;

use crate::domain::{Device, DeviceId, Hostname};

use super::define_port_error;

define_port_error! {
    /// Errors raised by power-control adapters.
    pub enum PowerControlError {
        /// The provider does not know the port.
        NotFound { port: i32 } => "device not found on port {port}",
        /// The provider could not be reached.
        Transport { message: String } => "provider transport failed: {message}",
        /// The provider answered with an unexpected status.
        Status { status: u16 } => "provider returned status {status}",
        /// The provider response could not be decoded.
        Decode { message: String } => "provider response is invalid: {message}",
    }
}

/// Device state as reported by the provider catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDevice {
    pub id: DeviceId,
    pub hostname: Hostname,
    pub is_turn_on: bool,
}

impl CatalogDevice {
    /// Local record for this catalog entry. Ownership always starts empty.
    pub fn into_device(self) -> Device {
        Device {
            id: self.id,
            hostname: self.hostname,
            is_turn_on: self.is_turn_on,
            owner: None,
        }
    }
}

/// Remote device catalog and power switch.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PowerControl: Send + Sync {
    /// List every device known to the provider.
    async fn list_devices(&self) -> Result<Vec<CatalogDevice>, PowerControlError>;

    /// Fetch one device by port.
    async fn device(&self, port: DeviceId) -> Result<CatalogDevice, PowerControlError>;

    /// Switch the port on.
    async fn power_on(&self, port: DeviceId) -> Result<(), PowerControlError>;

    /// Switch the port off.
    async fn power_off(&self, port: DeviceId) -> Result<(), PowerControlError>;
}
