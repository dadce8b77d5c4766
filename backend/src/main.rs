//! Backend entry-point: loads configuration, migrates the database, seeds the
//! administrator and serves the REST API.

mod server;

use std::ffi::OsString;
use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use rubus_api::config::{AdminSeed, AppConfig};
use rubus_api::domain::{NewUser, Role};
use rubus_api::inbound::http::health::HealthState;
use rubus_api::outbound::persistence::{
    DbPool, DieselDeviceRepository, DieselUserRepository, PoolConfig, run_migrations,
};
use server::{ServerConfig, build_services, create_server, outbound_collaborators};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = AppConfig::load_from_iter(std::env::args_os().collect::<Vec<OsString>>())
        .map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let settings = config.validate().wrap_err("invalid configuration")?;

    run_migrations(&settings.database_url)
        .await
        .wrap_err("database migration failed")?;
    let pool = DbPool::new(
        PoolConfig::new(settings.database_url.as_str()).with_max_size(settings.db_pool_max_size),
    )
    .await
    .wrap_err("failed to build database pool")?;

    let collaborators =
        outbound_collaborators(&settings).wrap_err("failed to build provider client")?;
    let services = build_services(
        Arc::new(DieselUserRepository::new(pool.clone())),
        Arc::new(DieselDeviceRepository::new(pool)),
        collaborators,
    );

    match &settings.admin {
        Some(seed) => {
            let admin = admin_user(seed)?;
            match services.accounts.ensure_admin(admin).await? {
                Some(user) => info!(user_id = %user.id, "administrator account created"),
                None => info!(username = %seed.username, "administrator account already present"),
            }
        }
        None => warn!("admin_password not configured; skipping administrator seeding"),
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state.clone(),
        ServerConfig::new(settings.bind_addr, services.http_state),
    )?;
    health_state.mark_ready();
    server.await?;
    health_state.mark_draining();
    Ok(())
}

fn admin_user(seed: &AdminSeed) -> Result<NewUser> {
    NewUser::try_from_parts(
        &seed.username,
        &seed.email,
        &seed.password,
        Some(Role::Administrator),
    )
    .wrap_err("invalid administrator seed")
}
