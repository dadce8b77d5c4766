//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. The
//! wrappers here mirror their serialised shape and live in the inbound adapter
//! where framework concerns belong.

#![expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]

use utoipa::ToSchema;

/// Error response payload.
#[derive(ToSchema)]
#[schema(as = Error)]
pub struct ErrorSchema {
    /// HTTP status code repeated in the body.
    #[schema(example = 404)]
    status: u16,
    /// Human-readable message.
    #[schema(example = "device not found")]
    error: String,
}

/// Account role.
#[derive(ToSchema)]
#[schema(as = Role)]
pub enum RoleSchema {
    #[schema(rename = "administrator")]
    Administrator,
    #[schema(rename = "user")]
    User,
}

/// Application user. The password hash is never part of this payload.
#[derive(ToSchema)]
#[schema(as = User)]
#[schema(rename_all = "camelCase")]
pub struct UserSchema {
    #[schema(example = 42)]
    id: i64,
    #[schema(example = "ada")]
    username: String,
    #[schema(example = "ada@example.com")]
    email: String,
    role: RoleSchema,
    /// Omitted when the account never expires.
    #[schema(value_type = Option<String>, format = DateTime)]
    expiration: Option<String>,
}

/// Registered device, keyed by its switch port.
#[derive(ToSchema)]
#[schema(as = Device)]
#[schema(rename_all = "camelCase")]
pub struct DeviceSchema {
    #[schema(example = 5)]
    id: i32,
    #[schema(example = "pi05")]
    hostname: String,
    is_turn_on: bool,
    /// Owning user id, `null` when the device is free.
    #[schema(example = 42)]
    owner: Option<i64>,
}

/// Device record together with its background staging task.
#[derive(ToSchema)]
#[schema(as = ScheduledDevice)]
#[schema(rename_all = "camelCase")]
pub struct ScheduledDeviceSchema {
    device: DeviceSchema,
    #[schema(example = "6f1c1b0e-8f7a-4a53-9a53-0d6f5c1f2a11")]
    task_id: String,
}

/// Provisioning script kind.
#[derive(ToSchema)]
#[schema(as = ScriptAction)]
pub enum ScriptActionSchema {
    #[schema(rename = "add-device")]
    AddDevice,
    #[schema(rename = "delete-device")]
    DeleteDevice,
    #[schema(rename = "deploy-device")]
    DeployDevice,
}

/// Background provisioning task.
#[derive(ToSchema)]
#[schema(as = ProvisioningTask)]
#[schema(rename_all = "camelCase")]
pub struct ProvisioningTaskSchema {
    #[schema(example = "6f1c1b0e-8f7a-4a53-9a53-0d6f5c1f2a11")]
    id: String,
    action: ScriptActionSchema,
    #[schema(example = 5)]
    device: i32,
    #[schema(example = "pi05")]
    hostname: String,
    /// `{"state":"pending"}`, `{"state":"succeeded"}` or
    /// `{"state":"failed","reason":"..."}`.
    #[schema(value_type = Object)]
    status: serde_json::Value,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
    #[schema(value_type = Option<String>, format = DateTime)]
    finished_at: Option<String>,
}
