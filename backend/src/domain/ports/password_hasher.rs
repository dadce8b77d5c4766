//! Port for one-way password hashing.

use async_trait::async_trait;

use crate::domain::Password;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHashError {
        /// Hashing or verification could not complete.
        Hash { message: String } => "password hashing failed: {message}",
    }
}

/// Salted password hashing with a configurable work factor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Hash a validated password.
    async fn hash(&self, password: &Password) -> Result<String, PasswordHashError>;

    /// Compare a plaintext candidate with a stored hash.
    async fn verify(&self, candidate: &str, hash: &str) -> Result<bool, PasswordHashError>;
}

/// Reversible stand-in for tests that do not care about hashing cost.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePasswordHasher;

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl PasswordHasher for FixturePasswordHasher {
    async fn hash(&self, password: &Password) -> Result<String, PasswordHashError> {
        Ok(format!("fixture${}", password.expose()))
    }

    async fn verify(&self, candidate: &str, hash: &str) -> Result<bool, PasswordHashError> {
        Ok(hash.strip_prefix("fixture$") == Some(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn fixture_hash_never_equals_plaintext() {
        let password = Password::new("rubus_secret").expect("password");
        let hash = FixturePasswordHasher.hash(&password).await.expect("hash");
        assert_ne!(hash, "rubus_secret");
        assert!(FixturePasswordHasher.verify("rubus_secret", &hash).await.expect("verify"));
        assert!(!FixturePasswordHasher.verify("other", &hash).await.expect("verify"));
    }
}
