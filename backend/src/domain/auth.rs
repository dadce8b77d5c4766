//! Authentication primitives: login credentials and session claims.
//!
//! [`Claims`] is the typed request-scoped identity produced once by
//! `authorize` and passed explicitly to every operation that needs it.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::{Error, UserId};

/// Domain error returned when login parameters are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    EmptyUsername,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials.
///
/// # Examples
/// ```
/// use rubus_api::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" admin ", "rubus_secret").unwrap();
/// assert_eq!(creds.username(), "admin");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username used for the lookup.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"**redacted**")
            .finish()
    }
}

/// Claims carried by a signed session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user.
    pub sub: UserId,
    /// Administrator privilege flag.
    pub admin: bool,
    /// Expiry as Unix seconds.
    pub exp: i64,
    /// Issue time as Unix seconds.
    pub iat: i64,
}

impl Claims {
    /// Fail with `Unauthorized` unless the caller is an administrator.
    pub fn require_admin(&self) -> Result<(), Error> {
        if self.admin {
            Ok(())
        } else {
            Err(Error::unauthorized("administrator privileges required"))
        }
    }

    /// Fail with `Unauthorized` unless the caller is `target` or an
    /// administrator.
    pub fn require_self_or_admin(&self, target: UserId) -> Result<(), Error> {
        if self.admin || self.sub == target {
            Ok(())
        } else {
            Err(Error::unauthorized("not allowed to act on this resource"))
        }
    }
}
