//! Bcrypt implementation of the `PasswordHasher` port.
//!
//! Bcrypt is CPU bound, so both operations run on the blocking pool.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::Password;
use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// Salted bcrypt hashing at a fixed cost.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// Create a hasher. `cost` must lie within bcrypt's 4..=31 range.
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

fn join_error(err: tokio::task::JoinError) -> PasswordHashError {
    PasswordHashError::hash(format!("hashing task aborted: {err}"))
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: &Password) -> Result<String, PasswordHashError> {
        let plaintext = Zeroizing::new(password.expose().to_owned());
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext.as_str(), cost))
            .await
            .map_err(join_error)?
            .map_err(|err| PasswordHashError::hash(err.to_string()))
    }

    async fn verify(&self, candidate: &str, hash: &str) -> Result<bool, PasswordHashError> {
        let candidate = Zeroizing::new(candidate.to_owned());
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(candidate.as_str(), &hash))
            .await
            .map_err(join_error)?
            .map_err(|err| PasswordHashError::hash(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the suite fast.
    fn hasher() -> BcryptPasswordHasher {
        BcryptPasswordHasher::new(4)
    }

    #[tokio::test]
    async fn verifies_only_the_original_password() {
        let password = Password::new("rubus_secret").expect("password");
        let hash = hasher().hash(&password).await.expect("hash");

        assert!(hash.starts_with("$2"), "bcrypt hash expected, got {hash}");
        assert!(!hash.contains("rubus_secret"));
        assert!(hasher().verify("rubus_secret", &hash).await.expect("verify"));
        assert!(!hasher().verify("rubus_secreT", &hash).await.expect("verify"));
    }

    #[tokio::test]
    async fn hashes_are_salted() {
        let password = Password::new("rubus_secret").expect("password");
        let first = hasher().hash(&password).await.expect("hash");
        let second = hasher().hash(&password).await.expect("hash");
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        let err = hasher()
            .verify("rubus_secret", "not-a-bcrypt-hash")
            .await
            .expect_err("malformed hash");
        assert!(matches!(err, PasswordHashError::Hash { .. }));
    }
}
