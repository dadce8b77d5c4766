//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, provider, scripts, hashing, tokens) are
//! implemented under `outbound`; driving ports (`AuthService`, `UserService`,
//! `DeviceService`) are implemented by the domain services and called by the
//! HTTP adapter.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_service;
mod device_repository;
mod device_service;
mod password_hasher;
mod power_control;
mod script_runner;
mod task_registry;
mod token_codec;
mod user_repository;
mod user_service;

#[cfg(test)]
pub use auth_service::MockAuthService;
pub use auth_service::AuthService;
#[cfg(test)]
pub use device_repository::MockDeviceRepository;
pub use device_repository::{DevicePersistenceError, DeviceRepository};
#[cfg(test)]
pub use device_service::MockDeviceService;
pub use device_service::{DeviceService, ScheduledDevice};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
#[cfg(any(test, feature = "test-support"))]
pub use password_hasher::FixturePasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use power_control::MockPowerControl;
pub use power_control::{CatalogDevice, PowerControl, PowerControlError};
#[cfg(test)]
pub use script_runner::MockScriptRunner;
pub use script_runner::{ScriptError, ScriptRunner};
#[cfg(test)]
pub use task_registry::MockProvisioningTaskRegistry;
pub use task_registry::ProvisioningTaskRegistry;
#[cfg(test)]
pub use token_codec::MockTokenCodec;
pub use token_codec::{TokenCodec, TokenError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{
    NewUserRecord, StoredCredentials, UserChanges, UserPersistenceError, UserRepository,
};
#[cfg(test)]
pub use user_service::MockUserService;
pub use user_service::UserService;
