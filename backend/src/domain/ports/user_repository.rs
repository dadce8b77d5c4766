//! Port abstraction for user persistence adapters and their errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{EmailAddress, Role, User, UserId, Username};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// A unique constraint rejected the write.
        Conflict { constraint: String } => "user violates unique constraint {constraint}",
        /// The targeted user does not exist.
        NotFound => "user not found",
    }
}

/// Fields persisted when a user is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserRecord {
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: String,
    pub role: Role,
}

/// Column changes for a partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<Username>,
    pub email: Option<EmailAddress>,
    pub password_hash: Option<String>,
}

/// User together with its stored password hash, for credential checks only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Port for reading and writing users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; fails with `Conflict` on a duplicate username or email.
    async fn create(&self, user: &NewUserRecord) -> Result<User, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user and password hash by username.
    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError>;

    /// List every user ordered by identifier.
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Apply a partial update; fails with `NotFound` if the user vanished.
    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, UserPersistenceError>;

    /// Replace the account expiration.
    async fn set_expiration(
        &self,
        id: UserId,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<User, UserPersistenceError>;

    /// Remove a user; fails with `NotFound` if absent.
    async fn delete(&self, id: UserId) -> Result<(), UserPersistenceError>;
}
