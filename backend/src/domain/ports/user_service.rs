//! Driving port for user management.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Claims, Error, NewUser, User, UserId, UserUpdate};

/// Use-case port for user accounts. Every call carries the caller's claims.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create a user. Administrators only.
    async fn create(&self, claims: &Claims, user: NewUser) -> Result<User, Error>;

    /// Fetch a user. The user themself or an administrator.
    async fn get(&self, claims: &Claims, id: UserId) -> Result<User, Error>;

    /// List every user.
    async fn list(&self, claims: &Claims) -> Result<Vec<User>, Error>;

    /// Apply a partial update. The user themself or an administrator.
    async fn update(&self, claims: &Claims, id: UserId, update: UserUpdate)
    -> Result<User, Error>;

    /// Delete a user. The user themself or an administrator.
    async fn delete(&self, claims: &Claims, id: UserId) -> Result<(), Error>;

    /// Set or clear the account expiration date. Administrators only.
    async fn set_expiration(
        &self,
        claims: &Claims,
        id: UserId,
        expiration: Option<NaiveDate>,
    ) -> Result<User, Error>;
}
