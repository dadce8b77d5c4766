//! Device lifecycle handlers.
//!
//! ```text
//! GET  /device
//! GET  /device/{id}
//! POST /device/{id}/acquire | /release | /on | /off | /deploy
//! GET  /task/{id}
//! ```
//!
//! Device identifiers are switch ports; non-positive values are rejected
//! before any service call.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Device, DeviceId, Error, ProvisioningTask, TaskId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::{DeviceSchema, ErrorSchema, ProvisioningTaskSchema};
use crate::inbound::http::state::HttpState;

/// Handle of a background provisioning run.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskAccepted {
    #[schema(value_type = String, example = "6f1c1b0e-8f7a-4a53-9a53-0d6f5c1f2a11")]
    pub task_id: TaskId,
}

pub(crate) fn parse_device_id(raw: i32) -> Result<DeviceId, Error> {
    DeviceId::new(raw).map_err(|err| Error::bad_request(err.to_string()))
}

/// List registered devices.
#[utoipa::path(
    get,
    path = "/device",
    responses(
        (status = 200, description = "Registered devices", body = [DeviceSchema]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["devices"],
    operation_id = "listDevices"
)]
#[get("/device")]
pub async fn list_devices(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<Vec<Device>>> {
    Ok(web::Json(state.devices.list(auth.claims()).await?))
}

/// Fetch one device.
#[utoipa::path(
    get,
    path = "/device/{id}",
    params(("id" = i32, Path, description = "Switch port of the device")),
    responses(
        (status = 200, description = "Device", body = DeviceSchema),
        (status = 400, description = "Invalid port", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not registered", body = ErrorSchema)
    ),
    tags = ["devices"],
    operation_id = "getDevice"
)]
#[get("/device/{id}")]
pub async fn get_device(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Device>> {
    let id = parse_device_id(path.into_inner())?;
    Ok(web::Json(state.devices.get(auth.claims(), id).await?))
}

/// Claim an unowned device.
#[utoipa::path(
    post,
    path = "/device/{id}/acquire",
    params(("id" = i32, Path, description = "Switch port of the device")),
    responses(
        (status = 200, description = "Device now owned by the caller", body = DeviceSchema),
        (status = 401, description = "Unauthorised or already owned", body = ErrorSchema),
        (status = 404, description = "Not registered", body = ErrorSchema)
    ),
    tags = ["devices"],
    operation_id = "acquireDevice"
)]
#[post("/device/{id}/acquire")]
pub async fn acquire_device(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Device>> {
    let id = parse_device_id(path.into_inner())?;
    Ok(web::Json(state.devices.acquire(auth.claims(), id).await?))
}

/// Give a device back.
#[utoipa::path(
    post,
    path = "/device/{id}/release",
    params(("id" = i32, Path, description = "Switch port of the device")),
    responses(
        (status = 200, description = "Device is free", body = DeviceSchema),
        (status = 401, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Not registered", body = ErrorSchema)
    ),
    tags = ["devices"],
    operation_id = "releaseDevice"
)]
#[post("/device/{id}/release")]
pub async fn release_device(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Device>> {
    let id = parse_device_id(path.into_inner())?;
    Ok(web::Json(state.devices.release(auth.claims(), id).await?))
}

/// Switch a device on.
#[utoipa::path(
    post,
    path = "/device/{id}/on",
    params(("id" = i32, Path, description = "Switch port of the device")),
    responses(
        (status = 204, description = "Provider switched the port on"),
        (status = 401, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Not registered", body = ErrorSchema),
        (status = 500, description = "Provider failure", body = ErrorSchema)
    ),
    tags = ["devices"],
    operation_id = "powerOn"
)]
#[post("/device/{id}/on")]
pub async fn power_on(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let id = parse_device_id(path.into_inner())?;
    state.devices.power_on(auth.claims(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Switch a device off.
#[utoipa::path(
    post,
    path = "/device/{id}/off",
    params(("id" = i32, Path, description = "Switch port of the device")),
    responses(
        (status = 204, description = "Provider switched the port off"),
        (status = 401, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Not registered", body = ErrorSchema),
        (status = 500, description = "Provider failure", body = ErrorSchema)
    ),
    tags = ["devices"],
    operation_id = "powerOff"
)]
#[post("/device/{id}/off")]
pub async fn power_off(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let id = parse_device_id(path.into_inner())?;
    state.devices.power_off(auth.claims(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Stage a deployment and power-cycle the device into it.
///
/// The staging script keeps running after the response; poll
/// `GET /task/{taskId}` for its outcome.
#[utoipa::path(
    post,
    path = "/device/{id}/deploy",
    params(("id" = i32, Path, description = "Switch port of the device")),
    responses(
        (status = 202, description = "Deployment started", body = TaskAccepted),
        (status = 401, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Not registered", body = ErrorSchema),
        (status = 500, description = "Provider failure", body = ErrorSchema)
    ),
    tags = ["devices"],
    operation_id = "deployDevice"
)]
#[post("/device/{id}/deploy")]
pub async fn deploy_device(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let id = parse_device_id(path.into_inner())?;
    let task_id = state.devices.deploy(auth.claims(), id).await?;
    Ok(HttpResponse::Accepted().json(TaskAccepted { task_id }))
}

/// Look up a background provisioning task.
#[utoipa::path(
    get,
    path = "/task/{id}",
    params(("id" = String, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "Task record", body = ProvisioningTaskSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unknown or evicted task", body = ErrorSchema)
    ),
    tags = ["devices"],
    operation_id = "getTask"
)]
#[get("/task/{id}")]
pub async fn get_task(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<ProvisioningTask>> {
    let id = TaskId::from_uuid(path.into_inner());
    Ok(web::Json(state.devices.task(auth.claims(), id).await?))
}

#[cfg(test)]
#[path = "devices_tests.rs"]
mod tests;
