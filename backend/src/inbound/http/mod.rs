//! HTTP inbound adapter exposing REST endpoints.

pub mod admin;
pub mod auth;
pub mod devices;
pub mod error;
pub mod health;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;

use actix_web::web;

pub use error::ApiResult;

/// Register every API route and route extractor rejections through the
/// domain error format.
///
/// Health probes are not included; they are mounted separately so they
/// stay outside the tracing middleware.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _| error::bad_input(err)))
        .app_data(web::PathConfig::default().error_handler(|err, _| error::bad_input(err)))
        .app_data(web::JsonConfig::default().error_handler(|err, _| error::bad_input(err)))
        .service(users::login)
        .service(users::list_users)
        .service(users::current_user)
        .service(users::update_current_user)
        .service(users::delete_current_user)
        .service(devices::list_devices)
        .service(devices::get_device)
        .service(devices::acquire_device)
        .service(devices::release_device)
        .service(devices::power_on)
        .service(devices::power_off)
        .service(devices::deploy_device)
        .service(devices::get_task)
        .service(admin::create_user)
        .service(admin::admin_list_users)
        .service(admin::set_user_expiration)
        .service(admin::delete_user)
        .service(admin::register_all_devices)
        .service(admin::register_device)
        .service(admin::create_device)
        .service(admin::delete_device);
}
