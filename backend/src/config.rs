//! Application configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `RUBUS_*` environment variables and an
//! optional config file, in that order of precedence. [`AppConfig::validate`]
//! turns the loosely typed settings into a [`ValidatedConfig`] the binary can
//! wire adapters from without further checks.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use zeroize::Zeroizing;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PROVIDER_URL: &str = "http://rubus_provider:1080";
const DEFAULT_SCRIPTS_DIR: &str = "./scripts";
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_EMAIL: &str = "admin@mail.com";
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// Raw settings as loaded from the configuration sources.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RUBUS")]
pub struct AppConfig {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Secret used to sign session tokens.
    pub jwt_secret: Option<String>,
    /// bcrypt work factor.
    #[ortho_config(default = 10)]
    pub hash_cost: u32,
    /// Token lifetime for accounts without an expiration date.
    #[ortho_config(default = 24)]
    pub token_ttl_hours: u32,
    /// Base URL of the power-control provider.
    pub provider_url: Option<String>,
    /// Per-request timeout for provider calls.
    #[ortho_config(default = 10)]
    pub provider_timeout_secs: u64,
    /// Directory holding the provisioning shell scripts.
    pub scripts_dir: Option<PathBuf>,
    /// Upper bound on a single script run.
    #[ortho_config(default = 300)]
    pub script_timeout_secs: u64,
    /// Maximum database connections.
    #[ortho_config(default = 10)]
    pub db_pool_max_size: u32,
    /// Username of the seeded administrator.
    pub admin_username: Option<String>,
    /// Email of the seeded administrator.
    pub admin_email: Option<String>,
    /// Password of the seeded administrator; seeding is skipped without it.
    pub admin_password: Option<String>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "**redacted**"))
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "**redacted**"))
            .field("hash_cost", &self.hash_cost)
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("provider_url", &self.provider_url)
            .field("provider_timeout_secs", &self.provider_timeout_secs)
            .field("scripts_dir", &self.scripts_dir)
            .field("script_timeout_secs", &self.script_timeout_secs)
            .field("db_pool_max_size", &self.db_pool_max_size)
            .field("admin_username", &self.admin_username)
            .field("admin_email", &self.admin_email)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "**redacted**"),
            )
            .finish()
    }
}

/// Reasons a loaded configuration cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} is not valid: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
    #[error("hash_cost must be between 4 and 31, got {cost}")]
    HashCost { cost: u32 },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Credentials for the administrator created on first start.
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: Zeroizing<String>,
}

/// Settings checked and converted into the types the adapters take.
pub struct ValidatedConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub jwt_secret: Zeroizing<String>,
    pub hash_cost: u32,
    pub token_ttl: chrono::Duration,
    pub provider_url: Url,
    pub provider_timeout: Duration,
    pub scripts_dir: PathBuf,
    pub script_timeout: Duration,
    pub db_pool_max_size: u32,
    /// `None` when no administrator password is configured.
    pub admin: Option<AdminSeed>,
}

fn required(value: Option<&String>, field: &'static str) -> Result<String, ConfigError> {
    let value = value.ok_or(ConfigError::Missing { field })?;
    if value.trim().is_empty() {
        return Err(ConfigError::Empty { field });
    }
    Ok(value.clone())
}

fn non_zero(value: u64, field: &'static str) -> Result<Duration, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Zero { field });
    }
    Ok(Duration::from_secs(value))
}

impl AppConfig {
    /// Address to bind, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Provider base URL, falling back to the compose service name.
    pub fn provider_url(&self) -> &str {
        self.provider_url.as_deref().unwrap_or(DEFAULT_PROVIDER_URL)
    }

    /// Scripts directory, falling back to `./scripts`.
    pub fn scripts_dir(&self) -> PathBuf {
        self.scripts_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRIPTS_DIR))
    }

    /// Check every field and convert to runtime types.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let bind_addr = self
            .bind_addr()
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::Invalid {
                field: "bind_addr",
                message: err.to_string(),
            })?;
        let database_url = required(self.database_url.as_ref(), "database_url")?;
        let jwt_secret = Zeroizing::new(required(self.jwt_secret.as_ref(), "jwt_secret")?);
        if !BCRYPT_COST_RANGE.contains(&self.hash_cost) {
            return Err(ConfigError::HashCost {
                cost: self.hash_cost,
            });
        }
        if self.token_ttl_hours == 0 {
            return Err(ConfigError::Zero {
                field: "token_ttl_hours",
            });
        }
        if self.db_pool_max_size == 0 {
            return Err(ConfigError::Zero {
                field: "db_pool_max_size",
            });
        }
        let provider_url =
            Url::parse(self.provider_url()).map_err(|err| ConfigError::Invalid {
                field: "provider_url",
                message: err.to_string(),
            })?;

        Ok(ValidatedConfig {
            bind_addr,
            database_url,
            jwt_secret,
            hash_cost: self.hash_cost,
            token_ttl: chrono::Duration::hours(i64::from(self.token_ttl_hours)),
            provider_url,
            provider_timeout: non_zero(self.provider_timeout_secs, "provider_timeout_secs")?,
            scripts_dir: self.scripts_dir(),
            script_timeout: non_zero(self.script_timeout_secs, "script_timeout_secs")?,
            db_pool_max_size: self.db_pool_max_size,
            admin: self.admin_seed(),
        })
    }

    fn admin_seed(&self) -> Option<AdminSeed> {
        let password = self
            .admin_password
            .as_ref()
            .filter(|password| !password.is_empty())?;
        Some(AdminSeed {
            username: self
                .admin_username
                .clone()
                .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_owned()),
            email: self
                .admin_email
                .clone()
                .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_owned()),
            password: Zeroizing::new(password.clone()),
        })
    }
}
