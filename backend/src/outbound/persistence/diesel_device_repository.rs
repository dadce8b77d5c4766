//! PostgreSQL-backed `DeviceRepository` implementation using Diesel ORM.
//!
//! Acquire is a single conditional `UPDATE ... WHERE owner IS NULL`, so two
//! concurrent claims on the same device cannot both win. Batch registration
//! runs in one transaction.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{DevicePersistenceError, DeviceRepository};
use crate::domain::{Device, DeviceId, UserId};

use super::diesel_error_mapping::{DieselErrorSink, map_diesel_error};
use super::models::DeviceRow;
use super::pool::{DbPool, PoolError};
use super::schema::devices;

impl DieselErrorSink for DevicePersistenceError {
    fn connection_failed(message: String) -> Self {
        Self::connection(message)
    }

    fn query_failed(message: String) -> Self {
        Self::query(message)
    }

    fn constraint_violated(constraint: String) -> Self {
        Self::conflict(constraint)
    }

    fn reference_missing(constraint: String) -> Self {
        Self::missing_reference(constraint)
    }
}

fn map_pool_error(error: PoolError) -> DevicePersistenceError {
    DevicePersistenceError::connection(error.into_message())
}

fn decode(row: DeviceRow) -> Result<Device, DevicePersistenceError> {
    let id = row.id;
    Device::try_from(row)
        .map_err(|err| DevicePersistenceError::query(format!("invalid stored device {id}: {err}")))
}

/// Diesel-backed implementation of the `DeviceRepository` port.
#[derive(Clone)]
pub struct DieselDeviceRepository {
    pool: DbPool,
}

impl DieselDeviceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRepository for DieselDeviceRepository {
    async fn insert(&self, device: &Device) -> Result<Device, DevicePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(devices::table)
            .values(DeviceRow::from(device))
            .returning(DeviceRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error::<DevicePersistenceError>)?;
        decode(row)
    }

    async fn insert_all(&self, batch: &[Device]) -> Result<Vec<Device>, DevicePersistenceError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<DeviceRow> = batch.iter().map(DeviceRow::from).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let inserted: Vec<DeviceRow> = conn
            .transaction(|conn| {
                async move {
                    diesel::insert_into(devices::table)
                        .values(&rows)
                        .returning(DeviceRow::as_returning())
                        .get_results(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error::<DevicePersistenceError>)?;
        inserted.into_iter().map(decode).collect()
    }

    async fn find(&self, id: DeviceId) -> Result<Option<Device>, DevicePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        devices::table
            .find(id.port())
            .select(DeviceRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error::<DevicePersistenceError>)?
            .map(decode)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Device>, DevicePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<DeviceRow> = devices::table
            .order(devices::id.asc())
            .select(DeviceRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error::<DevicePersistenceError>)?;
        rows.into_iter().map(decode).collect()
    }

    async fn delete(&self, id: DeviceId) -> Result<(), DevicePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(devices::table.find(id.port()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error::<DevicePersistenceError>)?;
        if deleted == 0 {
            return Err(DevicePersistenceError::not_found());
        }
        Ok(())
    }

    async fn set_power(&self, id: DeviceId, on: bool) -> Result<Device, DevicePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(devices::table.find(id.port()))
            .set(devices::is_turn_on.eq(on))
            .returning(DeviceRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error::<DevicePersistenceError>)?
            .ok_or_else(DevicePersistenceError::not_found)
            .and_then(decode)
    }

    async fn set_owner(
        &self,
        id: DeviceId,
        owner: Option<UserId>,
    ) -> Result<Device, DevicePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(devices::table.find(id.port()))
            .set(devices::owner.eq(owner.map(UserId::get)))
            .returning(DeviceRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error::<DevicePersistenceError>)?
            .ok_or_else(DevicePersistenceError::not_found)
            .and_then(decode)
    }

    async fn acquire(&self, id: DeviceId, owner: UserId) -> Result<Device, DevicePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let claimed = diesel::update(
            devices::table
                .find(id.port())
                .filter(devices::owner.is_null()),
        )
        .set(devices::owner.eq(Some(owner.get())))
        .returning(DeviceRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error::<DevicePersistenceError>)?;

        if let Some(row) = claimed {
            return decode(row);
        }

        // Nothing matched: either the device is missing or someone owns it.
        let current: Option<Option<i64>> = devices::table
            .find(id.port())
            .select(devices::owner)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error::<DevicePersistenceError>)?;
        match current {
            None => Err(DevicePersistenceError::not_found()),
            Some(Some(existing)) => Err(DevicePersistenceError::already_owned(existing)),
            Some(None) => Err(DevicePersistenceError::query(
                "conditional ownership update matched no row",
            )),
        }
    }
}
