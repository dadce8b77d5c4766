//! Shared harness for the integration suites: the full route table wired to
//! the real domain services over in-memory ports.

#![allow(dead_code, reason = "each suite uses a different subset of the harness")]

use std::sync::Arc;
use std::time::Duration as StdDuration;

use actix_web::dev::ServiceResponse;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test, web};
use chrono::Duration;
use mockable::DefaultClock;
use serde_json::Value;

use rubus_api::Trace;
use rubus_api::domain::ports::{FixturePasswordHasher, UserService};
use rubus_api::domain::{
    Device, DeviceProvisioningService, NewUser, Role, TokenAuthService, User, UserAccountService,
};
use rubus_api::inbound::http::configure;
use rubus_api::inbound::http::state::HttpState;
use rubus_api::outbound::security::JwtTokenCodec;
use rubus_api::outbound::tasks::InMemoryTaskRegistry;
use rubus_api::test_support::{
    InMemoryDeviceRepository, InMemoryUserRepository, RecordingPowerControl,
    RecordingScriptRunner, claims_for,
};

pub const PASSWORD: &str = "rubus_secret";
pub const JWT_SECRET: &[u8] = b"integration-secret";

/// Wired application plus handles on the doubles it talks to.
pub struct Harness {
    pub state: web::Data<HttpState>,
    pub devices: Arc<InMemoryDeviceRepository>,
    pub power: Arc<RecordingPowerControl>,
    pub scripts: Arc<RecordingScriptRunner>,
    accounts: Arc<UserAccountService<InMemoryUserRepository, FixturePasswordHasher>>,
}

impl Harness {
    /// Empty storage and an empty provider catalog.
    pub fn empty() -> Self {
        Self::with_catalog(Vec::<Device>::new())
    }

    /// Empty storage; the provider serves `catalog`.
    pub fn with_catalog(catalog: impl IntoIterator<Item = Device>) -> Self {
        let users = Arc::new(InMemoryUserRepository::default());
        let devices = Arc::new(InMemoryDeviceRepository::default());
        let power = Arc::new(RecordingPowerControl::with_catalog(catalog));
        let scripts = Arc::new(RecordingScriptRunner::default());
        let hasher = Arc::new(FixturePasswordHasher);
        let clock = Arc::new(DefaultClock);

        let accounts = Arc::new(UserAccountService::new(
            Arc::clone(&users),
            Arc::clone(&hasher),
        ));
        let auth = TokenAuthService::new(
            users,
            hasher,
            Arc::new(JwtTokenCodec::new(JWT_SECRET)),
            clock.clone(),
            Duration::hours(1),
        );
        let provisioning = DeviceProvisioningService::new(
            Arc::clone(&devices),
            power.clone(),
            scripts.clone(),
            Arc::new(InMemoryTaskRegistry::default()),
            clock,
        );
        let state = web::Data::new(HttpState::new(
            Arc::new(auth),
            accounts.clone(),
            Arc::new(provisioning),
        ));

        Self {
            state,
            devices,
            power,
            scripts,
            accounts,
        }
    }

    /// Create an account directly through the service layer.
    pub async fn create_user(&self, username: &str, role: Role) -> User {
        let new_user = NewUser::try_from_parts(
            username,
            &format!("{username}@example.com"),
            PASSWORD,
            Some(role),
        )
        .expect("valid user fields");
        self.accounts
            .create(&claims_for(0, true), new_user)
            .await
            .expect("user created")
    }

    /// Send one request through the full middleware and route stack.
    pub async fn call(&self, request: test::TestRequest) -> ServiceResponse {
        let app = test::init_service(
            App::new()
                .app_data(self.state.clone())
                .wrap(Trace)
                .configure(configure),
        )
        .await;
        test::call_service(&app, request.to_request()).await
    }

    /// Log in over HTTP and return the bearer token.
    pub async fn login(&self, username: &str) -> String {
        let response = self
            .call(
                test::TestRequest::get()
                    .uri(&format!("/login?username={username}&password={PASSWORD}")),
            )
            .await;
        assert!(response.status().is_success(), "login for {username} failed");
        json_body(response).await["token"]
            .as_str()
            .expect("token string")
            .to_owned()
    }
}

pub fn bearer(request: test::TestRequest, token: &str) -> test::TestRequest {
    request.insert_header((AUTHORIZATION, format!("Bearer {token}")))
}

pub async fn json_body(response: ServiceResponse) -> Value {
    let bytes = test::read_body(response).await;
    serde_json::from_slice(&bytes).expect("json body")
}

/// Poll `GET /task/{id}` until the task leaves `pending`.
pub async fn wait_for_task(harness: &Harness, token: &str, task_id: &str) -> Value {
    for _ in 0..50 {
        let response = harness
            .call(bearer(
                test::TestRequest::get().uri(&format!("/task/{task_id}")),
                token,
            ))
            .await;
        let body = json_body(response).await;
        if body["status"]["state"] != "pending" {
            return body;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    panic!("task {task_id} did not finish");
}
