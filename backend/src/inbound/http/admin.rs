//! Administrative handlers for user accounts and device records.
//!
//! ```text
//! POST   /admin/user {"username":"ada","email":"ada@example.com","password":"..."}
//! GET    /admin/user
//! PUT    /admin/user/{id}?expiration=2026-12-31
//! DELETE /admin/user/{id}
//! POST   /admin/device?port=5&hostname=pi05
//! POST   /admin/device/all
//! POST   /admin/device/{id}/register
//! DELETE /admin/device?deviceId=5
//! ```
//!
//! Every route requires an administrator token; the checks live in the
//! domain services.

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Device, Error, Hostname, NewUser, Role, User, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::devices::parse_device_id;
use crate::inbound::http::schemas::{DeviceSchema, ErrorSchema, ScheduledDeviceSchema, UserSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::map_user_validation_error;

const EXPIRATION_FORMAT: &str = "%Y-%m-%d";

/// Body for `POST /admin/user`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct NewUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// `administrator` or `user`; defaults to `user`.
    pub role: Option<String>,
}

impl TryFrom<NewUserRequest> for NewUser {
    type Error = Error;

    fn try_from(value: NewUserRequest) -> Result<Self, Self::Error> {
        let role = value
            .role
            .as_deref()
            .map(str::parse::<Role>)
            .transpose()
            .map_err(map_user_validation_error)?;
        NewUser::try_from_parts(&value.username, &value.email, &value.password, role)
            .map_err(map_user_validation_error)
    }
}

/// Query for `PUT /admin/user/{id}`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpirationQuery {
    /// `YYYY-MM-DD`; empty or absent clears the expiration.
    pub expiration: Option<String>,
}

fn parse_expiration(raw: Option<&str>) -> Result<Option<NaiveDate>, Error> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, EXPIRATION_FORMAT)
            .map(Some)
            .map_err(|_| Error::bad_request("Expiration date is not valid.")),
    }
}

/// Query for `POST /admin/device`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CreateDeviceQuery {
    /// Switch port to register.
    pub port: i32,
    /// Overrides the hostname reported by the provider.
    pub hostname: Option<String>,
}

/// Query for `DELETE /admin/device`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDeviceQuery {
    /// Switch port of the device to remove.
    pub device_id: i32,
}

/// Create a user account.
#[utoipa::path(
    post,
    path = "/admin/user",
    request_body = NewUserRequest,
    responses(
        (status = 201, description = "User created", body = UserSchema),
        (status = 400, description = "Invalid field", body = ErrorSchema),
        (status = 401, description = "Administrators only", body = ErrorSchema),
        (status = 409, description = "Username or email taken", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "createUser"
)]
#[post("/admin/user")]
pub async fn create_user(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<NewUserRequest>,
) -> ApiResult<HttpResponse> {
    auth.claims().require_admin()?;
    let new_user = NewUser::try_from(payload.into_inner())?;
    let user = state.users.create(auth.claims(), new_user).await?;
    Ok(HttpResponse::Created().json(user))
}

/// List every account.
#[utoipa::path(
    get,
    path = "/admin/user",
    responses(
        (status = 200, description = "Users", body = [UserSchema]),
        (status = 401, description = "Administrators only", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminListUsers"
)]
#[get("/admin/user")]
pub async fn admin_list_users(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<Vec<User>>> {
    auth.claims().require_admin()?;
    Ok(web::Json(state.users.list(auth.claims()).await?))
}

/// Set or clear an account's expiration date.
#[utoipa::path(
    put,
    path = "/admin/user/{id}",
    params(("id" = i64, Path, description = "User identifier"), ExpirationQuery),
    responses(
        (status = 200, description = "Updated user", body = UserSchema),
        (status = 400, description = "Expiration date is not valid.", body = ErrorSchema),
        (status = 401, description = "Administrators only", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "updateUserExpiration"
)]
#[put("/admin/user/{id}")]
pub async fn set_user_expiration(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
    query: web::Query<ExpirationQuery>,
) -> ApiResult<web::Json<User>> {
    let expiration = parse_expiration(query.expiration.as_deref())?;
    let id = UserId::new(path.into_inner());
    let user = state
        .users
        .set_expiration(auth.claims(), id, expiration)
        .await?;
    Ok(web::Json(user))
}

/// Delete an account.
#[utoipa::path(
    delete,
    path = "/admin/user/{id}",
    params(("id" = i64, Path, description = "User identifier")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Administrators only", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "deleteUser"
)]
#[delete("/admin/user/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    auth.claims().require_admin()?;
    state
        .users
        .delete(auth.claims(), UserId::new(path.into_inner()))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register a port and stage its boot files in the background.
#[utoipa::path(
    post,
    path = "/admin/device",
    params(CreateDeviceQuery),
    responses(
        (status = 201, description = "Device registered; staging task started", body = ScheduledDeviceSchema),
        (status = 400, description = "Invalid port or hostname", body = ErrorSchema),
        (status = 401, description = "Administrators only", body = ErrorSchema),
        (status = 404, description = "Port unknown to the provider", body = ErrorSchema),
        (status = 409, description = "Already registered", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "createDevice"
)]
#[post("/admin/device")]
pub async fn create_device(
    state: web::Data<HttpState>,
    auth: Authenticated,
    query: web::Query<CreateDeviceQuery>,
) -> ApiResult<HttpResponse> {
    let CreateDeviceQuery { port, hostname } = query.into_inner();
    let port = parse_device_id(port)?;
    let hostname = hostname
        .filter(|value| !value.trim().is_empty())
        .map(|value| Hostname::new(value.trim()))
        .transpose()
        .map_err(|err| Error::bad_request(err.to_string()))?;
    let scheduled = state
        .devices
        .create_record(auth.claims(), port, hostname)
        .await?;
    Ok(HttpResponse::Created().json(scheduled))
}

/// Copy the provider's whole catalog into storage.
#[utoipa::path(
    post,
    path = "/admin/device/all",
    responses(
        (status = 201, description = "Devices registered", body = [DeviceSchema]),
        (status = 401, description = "Administrators only", body = ErrorSchema),
        (status = 409, description = "A port is already registered; nothing was stored", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "registerAllDevices"
)]
#[post("/admin/device/all")]
pub async fn register_all_devices(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<HttpResponse> {
    let devices = state.devices.register_all(auth.claims()).await?;
    Ok(HttpResponse::Created().json(devices))
}

/// Copy one port from the provider catalog without staging boot files.
#[utoipa::path(
    post,
    path = "/admin/device/{id}/register",
    params(("id" = i32, Path, description = "Switch port of the device")),
    responses(
        (status = 201, description = "Device registered", body = DeviceSchema),
        (status = 401, description = "Administrators only", body = ErrorSchema),
        (status = 404, description = "Port unknown to the provider", body = ErrorSchema),
        (status = 409, description = "Already registered", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "registerDevice"
)]
#[post("/admin/device/{id}/register")]
pub async fn register_device(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let port = parse_device_id(path.into_inner())?;
    let device: Device = state.devices.register(auth.claims(), port).await?;
    Ok(HttpResponse::Created().json(device))
}

/// Remove a device's boot files, then its record.
#[utoipa::path(
    delete,
    path = "/admin/device",
    params(DeleteDeviceQuery),
    responses(
        (status = 204, description = "Device removed"),
        (status = 401, description = "Administrators only", body = ErrorSchema),
        (status = 404, description = "Not registered", body = ErrorSchema),
        (status = 500, description = "Cleanup script failed; record kept", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "deleteDevice"
)]
#[delete("/admin/device")]
pub async fn delete_device(
    state: web::Data<HttpState>,
    auth: Authenticated,
    query: web::Query<DeleteDeviceQuery>,
) -> ApiResult<HttpResponse> {
    let id = parse_device_id(query.device_id)?;
    state.devices.delete_record(auth.claims(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
