//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every handler under `inbound::http` plus the schema
//! wrappers from [`crate::inbound::http::schemas`]. Protected routes use the
//! `BearerAuth` scheme; login and the health probes opt out with
//! `security([])`.
//!
//! The document backs Swagger UI at `/docs` and is exported with
//! `cargo run --bin openapi-dump`.

use crate::inbound::http::admin::NewUserRequest;
use crate::inbound::http::devices::TaskAccepted;
use crate::inbound::http::schemas::{
    DeviceSchema, ErrorSchema, ProvisioningTaskSchema, RoleSchema, ScheduledDeviceSchema,
    ScriptActionSchema, UserSchema,
};
use crate::inbound::http::users::{TokenResponse, UpdateUserRequest};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Name of the bearer token security scheme.
pub const BEARER_SCHEME: &str = "BearerAuth";

/// Register the JWT bearer scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Token issued by GET /login."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Rubus API",
        description = "Provisioning and power control for network-booted edge devices."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_current_user,
        crate::inbound::http::users::delete_current_user,
        crate::inbound::http::devices::list_devices,
        crate::inbound::http::devices::get_device,
        crate::inbound::http::devices::acquire_device,
        crate::inbound::http::devices::release_device,
        crate::inbound::http::devices::power_on,
        crate::inbound::http::devices::power_off,
        crate::inbound::http::devices::deploy_device,
        crate::inbound::http::devices::get_task,
        crate::inbound::http::admin::create_user,
        crate::inbound::http::admin::admin_list_users,
        crate::inbound::http::admin::set_user_expiration,
        crate::inbound::http::admin::delete_user,
        crate::inbound::http::admin::create_device,
        crate::inbound::http::admin::register_all_devices,
        crate::inbound::http::admin::register_device,
        crate::inbound::http::admin::delete_device,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        RoleSchema,
        UserSchema,
        DeviceSchema,
        ScheduledDeviceSchema,
        ScriptActionSchema,
        ProvisioningTaskSchema,
        TokenResponse,
        UpdateUserRequest,
        NewUserRequest,
        TaskAccepted
    )),
    tags(
        (name = "users", description = "Login and self-service account operations"),
        (name = "devices", description = "Device ownership, power and deployment"),
        (name = "admin", description = "Administrator-only account and device management"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("Error", "status")]
    #[case("Error", "error")]
    #[case("User", "username")]
    #[case("Device", "isTurnOn")]
    #[case("ProvisioningTask", "status")]
    #[case("TaskAccepted", "taskId")]
    fn registered_schemas_expose_wire_fields(#[case] name: &str, #[case] field: &str) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas
            .get(name)
            .unwrap_or_else(|| panic!("{name} schema registered"));
        assert_object_schema_has_field(schema, field);
    }

    #[rstest]
    #[case("/login")]
    #[case("/user/me")]
    #[case("/device/{id}/deploy")]
    #[case("/task/{id}")]
    #[case("/admin/device")]
    #[case("/admin/device/all")]
    #[case("/admin/user/{id}")]
    #[case("/health/ready")]
    fn documents_route(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key(BEARER_SCHEME));
    }
}
