//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::User;
use crate::domain::UserId;
use crate::domain::ports::{
    NewUserRecord, StoredCredentials, UserChanges, UserPersistenceError, UserRepository,
};

use super::diesel_error_mapping::{DieselErrorSink, map_diesel_error};
use super::models::{NewUserRow, UserChangeset, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

impl DieselErrorSink for UserPersistenceError {
    fn connection_failed(message: String) -> Self {
        Self::connection(message)
    }

    fn query_failed(message: String) -> Self {
        Self::query(message)
    }

    fn constraint_violated(constraint: String) -> Self {
        Self::conflict(constraint)
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(error.into_message())
}

fn decode(row: UserRow) -> Result<StoredCredentials, UserPersistenceError> {
    let id = row.id;
    let (user, password_hash) = row
        .into_user()
        .map_err(|err| UserPersistenceError::query(format!("invalid stored user {id}: {err}")))?;
    Ok(StoredCredentials {
        user,
        password_hash,
    })
}

fn decode_user(row: UserRow) -> Result<User, UserPersistenceError> {
    decode(row).map(|stored| stored.user)
}

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, user: &NewUserRecord) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            username: user.username.as_ref(),
            email: user.email.as_ref(),
            password_hash: &user.password_hash,
            role: user.role.as_str(),
        };
        let inserted = diesel::insert_into(users::table)
            .values(&row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error::<UserPersistenceError>)?;
        decode_user(inserted)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error::<UserPersistenceError>)?
            .map(decode_user)
            .transpose()
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error::<UserPersistenceError>)?
            .map(decode)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .order(users::id.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error::<UserPersistenceError>)?;
        rows.into_iter().map(decode_user).collect()
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changeset = UserChangeset {
            username: changes.username.as_ref().map(AsRef::as_ref),
            email: changes.email.as_ref().map(AsRef::as_ref),
            password_hash: changes.password_hash.as_deref(),
            updated_at: Utc::now(),
        };
        diesel::update(users::table.find(id.get()))
            .set(&changeset)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error::<UserPersistenceError>)?
            .ok_or_else(UserPersistenceError::not_found)
            .and_then(decode_user)
    }

    async fn set_expiration(
        &self,
        id: UserId,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(users::table.find(id.get()))
            .set((
                users::expiration.eq(expiration),
                users::updated_at.eq(Utc::now()),
            ))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error::<UserPersistenceError>)?
            .ok_or_else(UserPersistenceError::not_found)
            .and_then(decode_user)
    }

    async fn delete(&self, id: UserId) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(users::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error::<UserPersistenceError>)?;
        if deleted == 0 {
            return Err(UserPersistenceError::not_found());
        }
        Ok(())
    }
}
