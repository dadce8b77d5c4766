//! Port abstraction for device persistence adapters and their errors.

use async_trait::async_trait;

use crate::domain::{Device, DeviceId, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by device repository adapters.
    pub enum DevicePersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "device repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "device repository query failed: {message}",
        /// A unique constraint rejected the write.
        Conflict { constraint: String } => "device violates unique constraint {constraint}",
        /// The targeted device does not exist.
        NotFound => "device not found",
        /// The write referenced a row that no longer exists, such as a
        /// deleted owner account.
        MissingReference { constraint: String } => "device references a missing row via {constraint}",
        /// A conditional ownership write lost against an existing owner.
        AlreadyOwned { owner: i64 } => "device is already owned by user {owner}",
    }
}

/// Port for reading and writing devices.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Insert a device; fails with `Conflict` when the identifier exists.
    async fn insert(&self, device: &Device) -> Result<Device, DevicePersistenceError>;

    /// Insert every device in one transaction. The first conflict aborts the
    /// whole batch.
    async fn insert_all(&self, devices: &[Device]) -> Result<Vec<Device>, DevicePersistenceError>;

    /// Fetch a device by identifier.
    async fn find(&self, id: DeviceId) -> Result<Option<Device>, DevicePersistenceError>;

    /// List every device ordered by identifier.
    async fn list(&self) -> Result<Vec<Device>, DevicePersistenceError>;

    /// Remove a device; fails with `NotFound` if absent.
    async fn delete(&self, id: DeviceId) -> Result<(), DevicePersistenceError>;

    /// Persist the power flag.
    async fn set_power(&self, id: DeviceId, on: bool) -> Result<Device, DevicePersistenceError>;

    /// Persist an ownership change unconditionally.
    async fn set_owner(
        &self,
        id: DeviceId,
        owner: Option<UserId>,
    ) -> Result<Device, DevicePersistenceError>;

    /// Claim an unowned device atomically.
    ///
    /// Only one of several concurrent callers can succeed; the others receive
    /// `AlreadyOwned`. A missing device yields `NotFound`; an owner account
    /// that no longer exists yields `MissingReference`.
    async fn acquire(&self, id: DeviceId, owner: UserId) -> Result<Device, DevicePersistenceError>;
}
