//! Driving port for login and token verification.
//!
//! Inbound adapters call this port to exchange credentials for a token and to
//! turn a bearer token back into [`Claims`] without touching persistence or
//! signing keys.

use async_trait::async_trait;

use crate::domain::{Claims, Error, LoginCredentials};

/// Use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Validate credentials and return a signed token.
    ///
    /// Unknown users, wrong passwords and expired accounts all fail with the
    /// same `Unauthorized` error.
    async fn login(&self, credentials: &LoginCredentials) -> Result<String, Error>;

    /// Verify a token and extract its claims.
    fn authorize(&self, token: &str) -> Result<Claims, Error>;
}
