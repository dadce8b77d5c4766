//! Builders wiring outbound adapters into the domain services and the HTTP
//! state.

use std::sync::Arc;

use actix_web::web;
use chrono::Duration;
use mockable::{Clock, DefaultClock};

use rubus_api::config::ValidatedConfig;
use rubus_api::domain::ports::{
    DeviceRepository, PasswordHasher, PowerControl, ProvisioningTaskRegistry, ScriptRunner,
    TokenCodec, UserRepository,
};
use rubus_api::domain::{DeviceProvisioningService, TokenAuthService, UserAccountService};
use rubus_api::inbound::http::state::HttpState;
use rubus_api::outbound::provider::HttpPowerControl;
use rubus_api::outbound::scripts::ProcessScriptRunner;
use rubus_api::outbound::security::{BcryptPasswordHasher, JwtTokenCodec};
use rubus_api::outbound::tasks::InMemoryTaskRegistry;

/// Driven adapters shared by the services, independent of storage.
pub struct Collaborators<H> {
    pub hasher: Arc<H>,
    pub tokens: Arc<dyn TokenCodec>,
    pub power: Arc<dyn PowerControl>,
    pub scripts: Arc<dyn ScriptRunner>,
    pub tasks: Arc<dyn ProvisioningTaskRegistry>,
    pub clock: Arc<dyn Clock>,
    pub token_ttl: Duration,
}

/// Wired services: the handler state plus the account service the binary
/// needs for seeding.
pub struct Services<U, H> {
    pub http_state: web::Data<HttpState>,
    pub accounts: Arc<UserAccountService<U, H>>,
}

/// Build the production collaborators from validated settings.
///
/// # Errors
/// Returns [`reqwest::Error`] when the provider client cannot be built.
pub fn outbound_collaborators(
    settings: &ValidatedConfig,
) -> Result<Collaborators<BcryptPasswordHasher>, reqwest::Error> {
    let power = HttpPowerControl::new(settings.provider_url.clone(), settings.provider_timeout)?;
    Ok(Collaborators {
        hasher: Arc::new(BcryptPasswordHasher::new(settings.hash_cost)),
        tokens: Arc::new(JwtTokenCodec::new(settings.jwt_secret.as_bytes())),
        power: Arc::new(power),
        scripts: Arc::new(ProcessScriptRunner::new(
            settings.scripts_dir.clone(),
            settings.script_timeout,
        )),
        tasks: Arc::new(InMemoryTaskRegistry::default()),
        clock: Arc::new(DefaultClock),
        token_ttl: settings.token_ttl,
    })
}

/// Assemble the domain services over the given repositories.
pub fn build_services<U, D, H>(
    users: Arc<U>,
    devices: Arc<D>,
    collaborators: Collaborators<H>,
) -> Services<U, H>
where
    U: UserRepository + 'static,
    D: DeviceRepository + 'static,
    H: PasswordHasher + 'static,
{
    let Collaborators {
        hasher,
        tokens,
        power,
        scripts,
        tasks,
        clock,
        token_ttl,
    } = collaborators;

    let accounts = Arc::new(UserAccountService::new(
        Arc::clone(&users),
        Arc::clone(&hasher),
    ));
    let auth = TokenAuthService::new(users, hasher, tokens, Arc::clone(&clock), token_ttl);
    let provisioning = DeviceProvisioningService::new(devices, power, scripts, tasks, clock);

    Services {
        http_state: web::Data::new(HttpState::new(
            Arc::new(auth),
            accounts.clone(),
            Arc::new(provisioning),
        )),
        accounts,
    }
}
