//! Token-based authentication service.
//!
//! Login checks credentials against the user repository and signs a claim set
//! with the configured [`TokenCodec`]. Tokens carry the user's own expiration
//! when one is set, otherwise a sliding window from the time of issue.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use tracing::{debug, error};

use super::user_service::map_user_persistence_error;
use crate::domain::ports::{AuthService, PasswordHasher, TokenCodec, UserRepository};
use crate::domain::{Claims, Error, LoginCredentials};

/// Message returned for every rejected login, whatever the cause.
const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Authentication service issuing signed session tokens.
pub struct TokenAuthService<R, H> {
    users: Arc<R>,
    hasher: Arc<H>,
    tokens: Arc<dyn TokenCodec>,
    clock: Arc<dyn Clock>,
    token_ttl: Duration,
}

impl<R, H> TokenAuthService<R, H> {
    /// Create a service. `token_ttl` applies to users without an expiration.
    pub fn new(
        users: Arc<R>,
        hasher: Arc<H>,
        tokens: Arc<dyn TokenCodec>,
        clock: Arc<dyn Clock>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            clock,
            token_ttl,
        }
    }
}

#[async_trait]
impl<R, H> AuthService for TokenAuthService<R, H>
where
    R: UserRepository,
    H: PasswordHasher,
{
    async fn login(&self, credentials: &LoginCredentials) -> Result<String, Error> {
        let Some(stored) = self
            .users
            .find_credentials(credentials.username())
            .await
            .map_err(map_user_persistence_error)?
        else {
            debug!("login rejected: unknown username");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        let matches = self
            .hasher
            .verify(credentials.password(), &stored.password_hash)
            .await
            .map_err(|err| {
                error!(user_id = %stored.user.id, error = %err, "password verification failed");
                Error::internal(err.to_string())
            })?;
        if !matches {
            debug!(user_id = %stored.user.id, "login rejected: password mismatch");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        let now = self.clock.utc();
        if stored.user.is_expired(now) {
            debug!(user_id = %stored.user.id, "login rejected: account expired");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        let expires_at = stored
            .user
            .effective_expiration()
            .unwrap_or(now + self.token_ttl);
        let claims = Claims {
            sub: stored.user.id,
            admin: stored.user.is_admin(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };
        self.tokens
            .encode(&claims)
            .map_err(|err| Error::internal(err.to_string()))
    }

    fn authorize(&self, token: &str) -> Result<Claims, Error> {
        self.tokens.decode(token).map_err(|err| {
            debug!(error = %err, "token rejected");
            Error::unauthorized("invalid or expired token")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        FixturePasswordHasher, MockTokenCodec, NewUserRecord, TokenError,
    };
    use crate::domain::{EmailAddress, ErrorCode, Role, UserId, Username};
    use crate::test_support::InMemoryUserRepository;
    use chrono::{DateTime, TimeZone, Utc};
    use mockable::MockClock;
    use rstest::{fixture, rstest};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn clock() -> Arc<dyn Clock> {
        let mut clock = MockClock::new();
        clock.expect_utc().returning(fixed_now);
        Arc::new(clock)
    }

    /// Codec that echoes the claims back so tests can inspect them.
    fn echo_codec() -> Arc<dyn TokenCodec> {
        let mut codec = MockTokenCodec::new();
        codec
            .expect_encode()
            .returning(|claims| serde_json::to_string(claims).map_err(|e| TokenError::encode(e.to_string())));
        codec.expect_decode().returning(|token| {
            serde_json::from_str(token).map_err(|e| TokenError::invalid(e.to_string()))
        });
        Arc::new(codec)
    }

    async fn seed(
        repo: &InMemoryUserRepository,
        username: &str,
        role: Role,
        expiration: Option<DateTime<Utc>>,
    ) -> UserId {
        let user = repo
            .create(&NewUserRecord {
                username: Username::new(username).expect("username"),
                email: EmailAddress::new(format!("{username}@example.com")).expect("email"),
                password_hash: "fixture$rubus_secret".to_owned(),
                role,
            })
            .await
            .expect("seed user");
        if expiration.is_some() {
            repo.set_expiration(user.id, expiration)
                .await
                .expect("set expiration");
        }
        user.id
    }

    #[fixture]
    fn repo() -> Arc<InMemoryUserRepository> {
        Arc::new(InMemoryUserRepository::default())
    }

    fn service(repo: &Arc<InMemoryUserRepository>) -> TokenAuthService<InMemoryUserRepository, FixturePasswordHasher> {
        TokenAuthService::new(
            Arc::clone(repo),
            Arc::new(FixturePasswordHasher),
            echo_codec(),
            clock(),
            Duration::hours(24),
        )
    }

    fn credentials(username: &str, password: &str) -> LoginCredentials {
        LoginCredentials::try_from_parts(username, password).expect("credentials")
    }

    #[rstest]
    #[tokio::test]
    async fn standard_user_gets_non_admin_claims_with_sliding_window(
        repo: Arc<InMemoryUserRepository>,
    ) {
        let id = seed(&repo, "ada", Role::User, None).await;
        let service = service(&repo);

        let token = service
            .login(&credentials("ada", "rubus_secret"))
            .await
            .expect("login succeeds");
        let claims = service.authorize(&token).expect("token verifies");

        assert_eq!(claims.sub, id);
        assert!(!claims.admin);
        assert_eq!(claims.iat, fixed_now().timestamp());
        assert_eq!(claims.exp, (fixed_now() + Duration::hours(24)).timestamp());
    }

    #[rstest]
    #[tokio::test]
    async fn admin_token_uses_account_expiration(repo: Arc<InMemoryUserRepository>) {
        let expires = fixed_now() + Duration::days(30);
        seed(&repo, "root", Role::Administrator, Some(expires)).await;

        let token = service(&repo)
            .login(&credentials("root", "rubus_secret"))
            .await
            .expect("login succeeds");
        let claims = service(&repo).authorize(&token).expect("verifies");

        assert!(claims.admin);
        assert_eq!(claims.exp, expires.timestamp());
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_user_wrong_password_and_expired_are_indistinguishable(
        repo: Arc<InMemoryUserRepository>,
    ) {
        seed(&repo, "ada", Role::User, None).await;
        seed(
            &repo,
            "old",
            Role::User,
            Some(fixed_now() - Duration::days(1)),
        )
        .await;
        let service = service(&repo);

        let unknown = service
            .login(&credentials("nobody", "rubus_secret"))
            .await
            .expect_err("unknown user");
        let wrong = service
            .login(&credentials("ada", "not the password"))
            .await
            .expect_err("wrong password");
        let expired = service
            .login(&credentials("old", "rubus_secret"))
            .await
            .expect_err("expired account");

        assert_eq!(unknown.code(), ErrorCode::Unauthorized);
        assert_eq!(unknown, wrong);
        assert_eq!(wrong, expired);
    }

    #[rstest]
    fn malformed_tokens_are_unauthorized(repo: Arc<InMemoryUserRepository>) {
        let err = service(&repo)
            .authorize("not-a-token")
            .expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}
