//! Device provisioning engine.
//!
//! Owns the device protocol: registration from the provider catalog,
//! ownership acquire and release, power switching and deployment. The
//! provider is the source of truth for power; the stored flag is only updated
//! after the provider call succeeds and only when it actually changes.
//!
//! Background script runs are tracked in a [`ProvisioningTaskRegistry`] so
//! their outcome can be queried after the request that started them returns.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::domain::ports::{
    DevicePersistenceError, DeviceRepository, DeviceService, PowerControl, PowerControlError,
    ProvisioningTaskRegistry, ScheduledDevice, ScriptRunner,
};
use crate::domain::{
    Claims, Device, DeviceId, Error, Hostname, PowerState, ProvisioningTask, ScriptAction, TaskId,
    TaskStatus, TraceId,
};

fn map_device_persistence_error(error: DevicePersistenceError) -> Error {
    match error {
        DevicePersistenceError::Connection { message } => {
            Error::internal(format!("device repository unavailable: {message}"))
        }
        DevicePersistenceError::Query { message } => {
            Error::internal(format!("device repository error: {message}"))
        }
        DevicePersistenceError::Conflict { .. } => Error::conflict("device is already registered"),
        DevicePersistenceError::NotFound => Error::not_found("device not found"),
        DevicePersistenceError::MissingReference { constraint } => {
            debug!(%constraint, "device write referenced a missing account");
            Error::unauthorized("account no longer exists")
        }
        DevicePersistenceError::AlreadyOwned { .. } => {
            Error::unauthorized("device is already owned")
        }
    }
}

fn map_power_control_error(error: PowerControlError) -> Error {
    match error {
        PowerControlError::NotFound { .. } => Error::not_found("device not found"),
        other => Error::internal(other.to_string()),
    }
}

/// Owner-or-admin gate. Unowned devices may be driven by any caller.
fn authorize_control(claims: &Claims, device: &Device) -> Result<(), Error> {
    match device.owner {
        Some(owner) => claims.require_self_or_admin(owner),
        None => Ok(()),
    }
}

/// Provisioning engine coordinating storage, the provider and scripts.
pub struct DeviceProvisioningService<D> {
    devices: Arc<D>,
    power: Arc<dyn PowerControl>,
    scripts: Arc<dyn ScriptRunner>,
    tasks: Arc<dyn ProvisioningTaskRegistry>,
    clock: Arc<dyn Clock>,
}

impl<D> DeviceProvisioningService<D>
where
    D: DeviceRepository,
{
    /// Create the engine from its collaborators.
    pub fn new(
        devices: Arc<D>,
        power: Arc<dyn PowerControl>,
        scripts: Arc<dyn ScriptRunner>,
        tasks: Arc<dyn ProvisioningTaskRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            devices,
            power,
            scripts,
            tasks,
            clock,
        }
    }

    async fn require_device(&self, id: DeviceId) -> Result<Device, Error> {
        self.devices
            .find(id)
            .await
            .map_err(map_device_persistence_error)?
            .ok_or_else(|| Error::not_found("device not found"))
    }

    /// Issue the provider call, then mirror the new state if it differs.
    async fn switch(&self, device: Device, target: PowerState) -> Result<Device, Error> {
        let switched = match target {
            PowerState::On => self.power.power_on(device.id).await,
            PowerState::Off => self.power.power_off(device.id).await,
        };
        switched.map_err(map_power_control_error)?;

        if device.power() == target {
            return Ok(device);
        }
        self.devices
            .set_power(device.id, target.is_on())
            .await
            .map_err(map_device_persistence_error)
    }

    /// Record a pending task and run the script in the background.
    fn spawn_script(&self, action: ScriptAction, device: &Device) -> TaskId {
        let task = ProvisioningTask::pending(
            action,
            device.id,
            device.hostname.clone(),
            self.clock.utc(),
        );
        let task_id = task.id;
        self.tasks.record(task);

        let scripts = Arc::clone(&self.scripts);
        let tasks = Arc::clone(&self.tasks);
        let clock = Arc::clone(&self.clock);
        let hostname = device.hostname.clone();
        let parent = TraceId::current();
        let span = info_span!("provisioning_task", %task_id, %action, hostname = %hostname);
        let run = TraceId::inherit(
            parent,
            async move {
                let status = match scripts.run(action, &hostname).await {
                    Ok(()) => {
                        info!("provisioning script finished");
                        TaskStatus::Succeeded
                    }
                    Err(err) => {
                        warn!(error = %err, "provisioning script failed");
                        TaskStatus::Failed {
                            reason: err.to_string(),
                        }
                    }
                };
                tasks.complete(task_id, status, clock.utc());
            }
            .instrument(span),
        );
        tokio::spawn(run);
        task_id
    }
}

#[async_trait]
impl<D> DeviceService for DeviceProvisioningService<D>
where
    D: DeviceRepository + 'static,
{
    async fn list(&self, _claims: &Claims) -> Result<Vec<Device>, Error> {
        self.devices
            .list()
            .await
            .map_err(map_device_persistence_error)
    }

    async fn get(&self, _claims: &Claims, id: DeviceId) -> Result<Device, Error> {
        self.require_device(id).await
    }

    async fn register(&self, claims: &Claims, port: DeviceId) -> Result<Device, Error> {
        claims.require_admin()?;
        let device = self
            .power
            .device(port)
            .await
            .map_err(map_power_control_error)?
            .into_device();
        self.devices
            .insert(&device)
            .await
            .map_err(map_device_persistence_error)
    }

    async fn register_all(&self, claims: &Claims) -> Result<Vec<Device>, Error> {
        claims.require_admin()?;
        let catalog = self
            .power
            .list_devices()
            .await
            .map_err(map_power_control_error)?;
        let devices: Vec<Device> = catalog.into_iter().map(|d| d.into_device()).collect();
        let inserted = self
            .devices
            .insert_all(&devices)
            .await
            .map_err(map_device_persistence_error)?;
        info!(count = inserted.len(), "registered provider catalog");
        Ok(inserted)
    }

    async fn create_record(
        &self,
        claims: &Claims,
        port: DeviceId,
        hostname: Option<Hostname>,
    ) -> Result<ScheduledDevice, Error> {
        claims.require_admin()?;
        let mut device = self
            .power
            .device(port)
            .await
            .map_err(map_power_control_error)?
            .into_device();
        if let Some(hostname) = hostname {
            device.hostname = hostname;
        }
        let device = self
            .devices
            .insert(&device)
            .await
            .map_err(map_device_persistence_error)?;
        let task_id = self.spawn_script(ScriptAction::AddDevice, &device);
        Ok(ScheduledDevice { device, task_id })
    }

    async fn delete_record(&self, claims: &Claims, id: DeviceId) -> Result<(), Error> {
        claims.require_admin()?;
        let device = self.require_device(id).await?;
        self.scripts
            .run(ScriptAction::DeleteDevice, &device.hostname)
            .await
            .map_err(|err| {
                warn!(hostname = %device.hostname, error = %err, "boot file cleanup failed");
                Error::internal(format!(
                    "failed to remove boot files for {}: {err}",
                    device.hostname
                ))
            })?;
        self.devices
            .delete(id)
            .await
            .map_err(map_device_persistence_error)?;
        info!(device = %id, hostname = %device.hostname, "device deleted");
        Ok(())
    }

    async fn acquire(&self, claims: &Claims, id: DeviceId) -> Result<Device, Error> {
        let device = self
            .devices
            .acquire(id, claims.sub)
            .await
            .map_err(map_device_persistence_error)?;
        info!(device = %id, owner = %claims.sub, "device acquired");
        Ok(device)
    }

    async fn release(&self, claims: &Claims, id: DeviceId) -> Result<Device, Error> {
        let device = self.require_device(id).await?;
        let Some(owner) = device.owner else {
            return Ok(device);
        };
        claims.require_self_or_admin(owner)?;
        let released = self
            .devices
            .set_owner(id, None)
            .await
            .map_err(map_device_persistence_error)?;
        info!(device = %id, previous_owner = %owner, "device released");
        Ok(released)
    }

    async fn power_on(&self, claims: &Claims, id: DeviceId) -> Result<Device, Error> {
        let device = self.require_device(id).await?;
        authorize_control(claims, &device)?;
        self.switch(device, PowerState::On).await
    }

    async fn power_off(&self, claims: &Claims, id: DeviceId) -> Result<Device, Error> {
        let device = self.require_device(id).await?;
        authorize_control(claims, &device)?;
        self.switch(device, PowerState::Off).await
    }

    async fn deploy(&self, claims: &Claims, id: DeviceId) -> Result<TaskId, Error> {
        let device = self.require_device(id).await?;
        authorize_control(claims, &device)?;
        let task_id = self.spawn_script(ScriptAction::DeployDevice, &device);

        let device = if device.power() == PowerState::On {
            self.switch(device, PowerState::Off).await?
        } else {
            device
        };
        self.switch(device, PowerState::On).await?;
        Ok(task_id)
    }

    async fn task(&self, _claims: &Claims, id: TaskId) -> Result<ProvisioningTask, Error> {
        self.tasks
            .find(id)
            .ok_or_else(|| Error::not_found("task not found"))
    }
}

#[cfg(test)]
#[path = "provisioning_tests.rs"]
mod tests;
