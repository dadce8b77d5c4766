//! User account domain service.
//!
//! Implements the [`UserService`] driving port over a [`UserRepository`] and a
//! [`PasswordHasher`]. Access rules are checked against the caller's claims
//! before any repository call.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use tracing::info;

use crate::domain::ports::{
    NewUserRecord, PasswordHasher, UserChanges, UserPersistenceError, UserRepository, UserService,
};
use crate::domain::{Claims, Error, NewUser, Role, User, UserId, UserUpdate};

pub(crate) fn map_user_persistence_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::internal(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::Conflict { constraint } => {
            let field = if constraint.contains("email") {
                "email"
            } else {
                "username"
            };
            Error::conflict(format!("a user with this {field} already exists"))
        }
        UserPersistenceError::NotFound => Error::not_found("user not found"),
    }
}

/// User account service.
#[derive(Clone)]
pub struct UserAccountService<R, H> {
    users: Arc<R>,
    hasher: Arc<H>,
}

impl<R, H> UserAccountService<R, H>
where
    R: UserRepository,
    H: PasswordHasher,
{
    /// Create a service over the given repository and hasher.
    pub fn new(users: Arc<R>, hasher: Arc<H>) -> Self {
        Self { users, hasher }
    }

    /// Create the distinguished administrator unless a user with that name
    /// already exists. Returns the created user, if any.
    pub async fn ensure_admin(&self, admin: NewUser) -> Result<Option<User>, Error> {
        let existing = self
            .users
            .find_credentials(admin.username.as_ref())
            .await
            .map_err(map_user_persistence_error)?;
        if existing.is_some() {
            return Ok(None);
        }

        let user = self
            .insert(NewUser {
                role: Role::Administrator,
                ..admin
            })
            .await?;
        info!(user_id = %user.id, username = user.username.as_ref(), "seeded administrator");
        Ok(Some(user))
    }

    async fn insert(&self, user: NewUser) -> Result<User, Error> {
        let password_hash = self
            .hasher
            .hash(&user.password)
            .await
            .map_err(|err| Error::internal(err.to_string()))?;
        let record = NewUserRecord {
            username: user.username,
            email: user.email,
            password_hash,
            role: user.role,
        };
        self.users
            .create(&record)
            .await
            .map_err(map_user_persistence_error)
    }

    async fn require_user(&self, id: UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_persistence_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }
}

#[async_trait]
impl<R, H> UserService for UserAccountService<R, H>
where
    R: UserRepository,
    H: PasswordHasher,
{
    async fn create(&self, claims: &Claims, user: NewUser) -> Result<User, Error> {
        claims.require_admin()?;
        self.insert(user).await
    }

    async fn get(&self, claims: &Claims, id: UserId) -> Result<User, Error> {
        claims.require_self_or_admin(id)?;
        self.require_user(id).await
    }

    async fn list(&self, _claims: &Claims) -> Result<Vec<User>, Error> {
        self.users.list().await.map_err(map_user_persistence_error)
    }

    async fn update(
        &self,
        claims: &Claims,
        id: UserId,
        update: UserUpdate,
    ) -> Result<User, Error> {
        claims.require_self_or_admin(id)?;
        if update.is_empty() {
            return self.require_user(id).await;
        }

        let password_hash = match &update.password {
            Some(password) => Some(
                self.hasher
                    .hash(password)
                    .await
                    .map_err(|err| Error::internal(err.to_string()))?,
            ),
            None => None,
        };
        let changes = UserChanges {
            username: update.username,
            email: update.email,
            password_hash,
        };
        self.users
            .update(id, &changes)
            .await
            .map_err(map_user_persistence_error)
    }

    async fn delete(&self, claims: &Claims, id: UserId) -> Result<(), Error> {
        claims.require_self_or_admin(id)?;
        self.users
            .delete(id)
            .await
            .map_err(map_user_persistence_error)
    }

    async fn set_expiration(
        &self,
        claims: &Claims,
        id: UserId,
        expiration: Option<NaiveDate>,
    ) -> Result<User, Error> {
        claims.require_admin()?;
        let at = expiration.map(|date| date.and_time(NaiveTime::MIN).and_utc());
        self.users
            .set_expiration(id, at)
            .await
            .map_err(map_user_persistence_error)
    }
}

#[cfg(test)]
#[path = "user_service_tests.rs"]
mod tests;
