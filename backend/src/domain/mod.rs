//! Domain primitives, services and ports.
//!
//! Purpose: Define strongly typed entities for users, devices and
//! provisioning tasks, the ports through which the domain reaches storage and
//! the outside world, and the services that enforce access rules.
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and stable error identifier.
//! - User, Device, ProvisioningTask: aggregates exposed over HTTP.
//! - Claims: authenticated caller identity carried by session tokens.
//! - UserAccountService, TokenAuthService, DeviceProvisioningService: port
//!   implementations wired by the server.

pub mod auth;
mod auth_service;
pub mod device;
pub mod error;
pub mod ports;
mod provisioning;
pub mod provisioning_task;
pub mod trace_id;
pub mod user;
mod user_service;

pub use self::auth::{Claims, LoginCredentials, LoginValidationError};
pub use self::auth_service::TokenAuthService;
pub use self::device::{
    Device, DeviceId, DeviceValidationError, HOSTNAME_LABEL_MAX, HOSTNAME_MAX, Hostname, Ownership, PowerState,
};
pub use self::error::{Error, ErrorCode, default_message};
pub use self::provisioning::DeviceProvisioningService;
pub use self::provisioning_task::{ProvisioningTask, ScriptAction, TaskId, TaskStatus};
pub use self::trace_id::TraceId;
pub use self::user::{
    EmailAddress, NewUser, PASSWORD_MIN, Password, Role, User, UserId, UserUpdate,
    UserValidationError, Username,
};
pub use self::user_service::UserAccountService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use rubus_api::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::unauthorized("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
