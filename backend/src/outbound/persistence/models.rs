//! Row types mapping between Diesel tables and domain entities.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{
    Device, DeviceId, DeviceValidationError, EmailAddress, Hostname, User, UserId,
    UserValidationError, Username,
};

use super::schema::{devices, users};

/// Selected columns of a `users` row, hash included.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub expiration: Option<DateTime<Utc>>,
}

impl UserRow {
    /// Convert into the domain user, dropping the hash.
    pub fn into_user(self) -> Result<(User, String), UserValidationError> {
        let user = User {
            id: UserId::new(self.id),
            username: Username::new(self.username)?,
            email: EmailAddress::new(self.email)?,
            role: self.role.parse()?,
            expiration: self.expiration,
        };
        Ok((user, self.password_hash))
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
}

/// Partial update; `None` columns are left untouched.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChangeset<'a> {
    pub username: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = devices)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DeviceRow {
    pub id: i32,
    pub hostname: String,
    pub is_turn_on: bool,
    pub owner: Option<i64>,
}

impl From<&Device> for DeviceRow {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id.port(),
            hostname: device.hostname.to_string(),
            is_turn_on: device.is_turn_on,
            owner: device.owner.map(UserId::get),
        }
    }
}

impl TryFrom<DeviceRow> for Device {
    type Error = DeviceValidationError;

    fn try_from(row: DeviceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: DeviceId::new(row.id)?,
            hostname: Hostname::new(row.hostname)?,
            is_turn_on: row.is_turn_on,
            owner: row.owner.map(UserId::new),
        })
    }
}
