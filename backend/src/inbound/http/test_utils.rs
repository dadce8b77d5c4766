//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, dev::ServiceResponse, test, web};
use serde_json::Value;

use crate::domain::Claims;
use crate::domain::ports::{MockAuthService, MockDeviceService, MockUserService};
use crate::inbound::http::configure;
use crate::inbound::http::state::HttpState;
use crate::test_support::claims_for;

/// Token accepted by [`auth_accepting`] for a standard user (id 42).
pub const USER_TOKEN: &str = "user-token";
/// Token accepted by [`auth_accepting`] for an administrator (id 1).
pub const ADMIN_TOKEN: &str = "admin-token";

pub fn user_claims() -> Claims {
    claims_for(42, false)
}

pub fn admin_claims() -> Claims {
    claims_for(1, true)
}

/// Auth mock that maps the two fixture tokens to claims and rejects
/// everything else.
pub fn auth_accepting() -> MockAuthService {
    let mut auth = MockAuthService::new();
    auth.expect_authorize().returning(|token| match token {
        USER_TOKEN => Ok(user_claims()),
        ADMIN_TOKEN => Ok(admin_claims()),
        _ => Err(crate::domain::Error::unauthorized("invalid or expired token")),
    });
    auth
}

/// Bundle mocks into handler state.
pub fn state(
    auth: MockAuthService,
    users: MockUserService,
    devices: MockDeviceService,
) -> web::Data<HttpState> {
    web::Data::new(HttpState::new(
        Arc::new(auth),
        Arc::new(users),
        Arc::new(devices),
    ))
}

/// Run one request against the full route table.
pub async fn call(state: web::Data<HttpState>, request: test::TestRequest) -> ServiceResponse {
    let app = test::init_service(App::new().app_data(state).configure(configure)).await;
    test::call_service(&app, request.to_request()).await
}

/// Attach `Authorization: Bearer <token>`.
pub fn bearer(request: test::TestRequest, token: &str) -> test::TestRequest {
    request.insert_header((AUTHORIZATION, format!("Bearer {token}")))
}

/// Decode a JSON response body.
pub async fn json_body(response: ServiceResponse) -> Value {
    let bytes = test::read_body(response).await;
    serde_json::from_slice(&bytes).expect("json body")
}
