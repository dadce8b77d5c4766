//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;
pub use state_builders::{build_services, outbound_collaborators};

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;

use rubus_api::Trace;
#[cfg(debug_assertions)]
use rubus_api::doc::ApiDoc;
use rubus_api::inbound::http::configure;
use rubus_api::inbound::http::health::{HealthState, live, ready};
use rubus_api::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("")
        .app_data(http_state)
        .wrap(Trace)
        .configure(configure);

    let app = App::new()
        .app_data(health_state)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app.service(api)
}

/// Construct an Actix HTTP server for the given state.
///
/// Readiness is left to the caller so it can flip only once seeding is done.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        http_state,
    } = config;

    let server = HttpServer::new(move || build_app(health_state.clone(), http_state.clone()))
        .bind(bind_addr)?
        .run();
    info!(%bind_addr, "http server listening");
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use rubus_api::TraceId;
    use rubus_api::middleware::TRACE_ID_HEADER;

    use super::state_builders::tests::in_memory_services;

    #[rstest]
    #[actix_web::test]
    async fn api_routes_carry_trace_header_and_probes_do_not() {
        let health = web::Data::new(HealthState::new());
        health.mark_ready();
        let services = in_memory_services();
        let app = test::init_service(build_app(health, services.http_state)).await;

        let api = test::call_service(
            &app,
            test::TestRequest::get().uri("/device").to_request(),
        )
        .await;
        assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
        let header = api
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .expect("trace header");
        assert!(header.parse::<TraceId>().is_ok());

        let probe = test::call_service(
            &app,
            test::TestRequest::get().uri("/health/ready").to_request(),
        )
        .await;
        assert_eq!(probe.status(), StatusCode::OK);
        assert!(probe.headers().get(TRACE_ID_HEADER).is_none());
    }
}
