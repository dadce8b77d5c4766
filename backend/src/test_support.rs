//! In-memory port implementations shared by unit and integration tests.
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature so the
//! `tests/` suites can drive the full HTTP app without PostgreSQL, the
//! provider service or the shell scripts.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    CatalogDevice, DevicePersistenceError, DeviceRepository, NewUserRecord, PowerControl,
    PowerControlError, ScriptError, ScriptRunner, StoredCredentials, UserChanges,
    UserPersistenceError, UserRepository,
};
use crate::domain::{Claims, Device, DeviceId, Hostname, ScriptAction, User, UserId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Claims for a user that never expire.
pub fn claims_for(id: i64, admin: bool) -> Claims {
    Claims {
        sub: UserId::new(id),
        admin,
        exp: i64::MAX,
        iat: 0,
    }
}

/// Build a device from a raw port and hostname.
///
/// # Panics
/// Panics when the port or hostname is invalid.
pub fn device(port: i32, hostname: &str) -> Device {
    let id = DeviceId::new(port).unwrap_or_else(|err| panic!("invalid port {port}: {err}"));
    let hostname =
        Hostname::new(hostname).unwrap_or_else(|err| panic!("invalid hostname {hostname}: {err}"));
    Device::new(id, hostname)
}

/// User repository backed by a map, enforcing the same unique constraints as
/// the database schema.
#[derive(Default)]
pub struct InMemoryUserRepository {
    state: Mutex<UserState>,
}

#[derive(Default)]
struct UserState {
    next_id: i64,
    rows: BTreeMap<i64, StoredCredentials>,
}

impl UserState {
    fn check_unique(
        &self,
        skip: Option<i64>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), UserPersistenceError> {
        for (id, row) in &self.rows {
            if Some(*id) == skip {
                continue;
            }
            if username == Some(row.user.username.as_ref()) {
                return Err(UserPersistenceError::conflict("users_username_key"));
            }
            if email == Some(row.user.email.as_ref()) {
                return Err(UserPersistenceError::conflict("users_email_key"));
            }
        }
        Ok(())
    }
}

impl InMemoryUserRepository {
    /// Stored hash for a user, for assertions.
    pub fn password_hash(&self, id: UserId) -> Option<String> {
        lock(&self.state)
            .rows
            .get(&id.get())
            .map(|row| row.password_hash.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &NewUserRecord) -> Result<User, UserPersistenceError> {
        let mut state = lock(&self.state);
        state.check_unique(None, Some(user.username.as_ref()), Some(user.email.as_ref()))?;
        state.next_id += 1;
        let id = state.next_id;
        let created = User {
            id: UserId::new(id),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            expiration: None,
        };
        state.rows.insert(
            id,
            StoredCredentials {
                user: created.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(lock(&self.state)
            .rows
            .get(&id.get())
            .map(|row| row.user.clone()))
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        Ok(lock(&self.state)
            .rows
            .values()
            .find(|row| row.user.username.as_ref() == username)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        Ok(lock(&self.state)
            .rows
            .values()
            .map(|row| row.user.clone())
            .collect())
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, UserPersistenceError> {
        let mut state = lock(&self.state);
        state.check_unique(
            Some(id.get()),
            changes.username.as_ref().map(AsRef::as_ref),
            changes.email.as_ref().map(AsRef::as_ref),
        )?;
        let row = state
            .rows
            .get_mut(&id.get())
            .ok_or_else(UserPersistenceError::not_found)?;
        if let Some(username) = &changes.username {
            row.user.username = username.clone();
        }
        if let Some(email) = &changes.email {
            row.user.email = email.clone();
        }
        if let Some(hash) = &changes.password_hash {
            row.password_hash = hash.clone();
        }
        Ok(row.user.clone())
    }

    async fn set_expiration(
        &self,
        id: UserId,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<User, UserPersistenceError> {
        let mut state = lock(&self.state);
        let row = state
            .rows
            .get_mut(&id.get())
            .ok_or_else(UserPersistenceError::not_found)?;
        row.user.expiration = expiration;
        Ok(row.user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<(), UserPersistenceError> {
        lock(&self.state)
            .rows
            .remove(&id.get())
            .map(|_| ())
            .ok_or_else(UserPersistenceError::not_found)
    }
}

/// Device repository backed by a map. Acquire is a check-and-set under one
/// lock, matching the conditional update used by the database adapter.
#[derive(Default)]
pub struct InMemoryDeviceRepository {
    rows: Mutex<BTreeMap<DeviceId, Device>>,
}

impl InMemoryDeviceRepository {
    /// Repository pre-populated with `devices`.
    pub fn with_devices(devices: impl IntoIterator<Item = Device>) -> Self {
        Self {
            rows: Mutex::new(devices.into_iter().map(|d| (d.id, d)).collect()),
        }
    }

    fn modify(
        &self,
        id: DeviceId,
        change: impl FnOnce(&mut Device),
    ) -> Result<Device, DevicePersistenceError> {
        let mut rows = lock(&self.rows);
        let device = rows
            .get_mut(&id)
            .ok_or_else(DevicePersistenceError::not_found)?;
        change(device);
        Ok(device.clone())
    }
}

#[async_trait]
impl DeviceRepository for InMemoryDeviceRepository {
    async fn insert(&self, device: &Device) -> Result<Device, DevicePersistenceError> {
        let mut rows = lock(&self.rows);
        if rows.contains_key(&device.id) {
            return Err(DevicePersistenceError::conflict("devices_pkey"));
        }
        rows.insert(device.id, device.clone());
        Ok(device.clone())
    }

    async fn insert_all(&self, devices: &[Device]) -> Result<Vec<Device>, DevicePersistenceError> {
        let mut rows = lock(&self.rows);
        let mut staged = rows.clone();
        for device in devices {
            if staged.insert(device.id, device.clone()).is_some() {
                return Err(DevicePersistenceError::conflict("devices_pkey"));
            }
        }
        *rows = staged;
        Ok(devices.to_vec())
    }

    async fn find(&self, id: DeviceId) -> Result<Option<Device>, DevicePersistenceError> {
        Ok(lock(&self.rows).get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Device>, DevicePersistenceError> {
        Ok(lock(&self.rows).values().cloned().collect())
    }

    async fn delete(&self, id: DeviceId) -> Result<(), DevicePersistenceError> {
        lock(&self.rows)
            .remove(&id)
            .map(|_| ())
            .ok_or_else(DevicePersistenceError::not_found)
    }

    async fn set_power(&self, id: DeviceId, on: bool) -> Result<Device, DevicePersistenceError> {
        self.modify(id, |device| device.is_turn_on = on)
    }

    async fn set_owner(
        &self,
        id: DeviceId,
        owner: Option<UserId>,
    ) -> Result<Device, DevicePersistenceError> {
        self.modify(id, |device| device.owner = owner)
    }

    async fn acquire(&self, id: DeviceId, owner: UserId) -> Result<Device, DevicePersistenceError> {
        let mut rows = lock(&self.rows);
        let device = rows
            .get_mut(&id)
            .ok_or_else(DevicePersistenceError::not_found)?;
        if let Some(current) = device.owner {
            return Err(DevicePersistenceError::already_owned(current.get()));
        }
        device.owner = Some(owner);
        Ok(device.clone())
    }
}

/// Power call observed by [`RecordingPowerControl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerCall {
    On(i32),
    Off(i32),
}

/// Provider double serving a fixed catalog and recording power calls.
#[derive(Default)]
pub struct RecordingPowerControl {
    catalog: Vec<CatalogDevice>,
    calls: Mutex<Vec<PowerCall>>,
    failing: bool,
}

impl RecordingPowerControl {
    /// Provider serving `devices` as its catalog.
    pub fn with_catalog(devices: impl IntoIterator<Item = Device>) -> Self {
        Self {
            catalog: devices
                .into_iter()
                .map(|d| CatalogDevice {
                    id: d.id,
                    hostname: d.hostname,
                    is_turn_on: d.is_turn_on,
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Provider whose power calls fail with a transport error.
    pub fn unreachable() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Power calls received so far, in order.
    pub fn calls(&self) -> Vec<PowerCall> {
        lock(&self.calls).clone()
    }

    fn switch(&self, call: PowerCall) -> Result<(), PowerControlError> {
        if self.failing {
            return Err(PowerControlError::transport("connection refused"));
        }
        lock(&self.calls).push(call);
        Ok(())
    }
}

#[async_trait]
impl PowerControl for RecordingPowerControl {
    async fn list_devices(&self) -> Result<Vec<CatalogDevice>, PowerControlError> {
        Ok(self.catalog.clone())
    }

    async fn device(&self, port: DeviceId) -> Result<CatalogDevice, PowerControlError> {
        self.catalog
            .iter()
            .find(|d| d.id == port)
            .cloned()
            .ok_or_else(|| PowerControlError::not_found(port.port()))
    }

    async fn power_on(&self, port: DeviceId) -> Result<(), PowerControlError> {
        self.switch(PowerCall::On(port.port()))
    }

    async fn power_off(&self, port: DeviceId) -> Result<(), PowerControlError> {
        self.switch(PowerCall::Off(port.port()))
    }
}

/// Script runner double recording invocations and optionally failing one
/// action.
#[derive(Default)]
pub struct RecordingScriptRunner {
    runs: Mutex<Vec<(ScriptAction, String)>>,
    failing: Option<ScriptAction>,
}

impl RecordingScriptRunner {
    /// Runner that fails every invocation of `action`.
    pub fn failing_on(action: ScriptAction) -> Self {
        Self {
            failing: Some(action),
            ..Self::default()
        }
    }

    /// Invocations so far as `(action, hostname)` pairs.
    pub fn runs(&self) -> Vec<(ScriptAction, String)> {
        lock(&self.runs).clone()
    }
}

#[async_trait]
impl ScriptRunner for RecordingScriptRunner {
    async fn run(&self, action: ScriptAction, hostname: &Hostname) -> Result<(), ScriptError> {
        lock(&self.runs).push((action, hostname.to_string()));
        if self.failing == Some(action) {
            return Err(ScriptError::exit("exit status: 1"));
        }
        Ok(())
    }
}
