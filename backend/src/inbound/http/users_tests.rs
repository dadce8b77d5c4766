//! Handler tests for login and the self-service user routes.

use super::*;
use crate::domain::ports::{MockAuthService, MockDeviceService, MockUserService};
use crate::domain::{EmailAddress, Role, UserId};
use crate::inbound::http::test_utils::{
    USER_TOKEN, auth_accepting, bearer, call, json_body, state,
};
use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use rstest::rstest;
use serde_json::json;

fn ada() -> User {
    User {
        id: UserId::new(42),
        username: Username::new("ada").expect("username"),
        email: EmailAddress::new("ada@example.com").expect("email"),
        role: Role::User,
        expiration: None,
    }
}

fn with_users(users: MockUserService) -> web::Data<crate::inbound::http::state::HttpState> {
    state(auth_accepting(), users, MockDeviceService::new())
}

#[actix_web::test]
async fn login_returns_token() {
    let mut auth = MockAuthService::new();
    auth.expect_login()
        .withf(|credentials| credentials.username() == "ada" && credentials.password() == "pw")
        .times(1)
        .returning(|_| Ok("signed.jwt.token".to_owned()));

    let response = call(
        state(auth, MockUserService::new(), MockDeviceService::new()),
        TestRequest::get().uri("/login?username=ada&password=pw"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"token": "signed.jwt.token"})
    );
}

#[rstest]
#[case::missing_password("/login?username=ada")]
#[case::empty_username("/login?username=&password=pw")]
#[case::blank_password("/login?username=ada&password=")]
#[actix_web::test]
async fn login_without_credentials_is_bad_request(#[case] uri: &str) {
    let mut auth = MockAuthService::new();
    auth.expect_login().never();

    let response = call(
        state(auth, MockUserService::new(), MockDeviceService::new()),
        TestRequest::get().uri(uri),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["status"], json!(400));
}

#[actix_web::test]
async fn rejected_login_is_unauthorized() {
    let mut auth = MockAuthService::new();
    auth.expect_login()
        .returning(|_| Err(Error::unauthorized("invalid credentials")));

    let response = call(
        state(auth, MockUserService::new(), MockDeviceService::new()),
        TestRequest::get().uri("/login?username=ada&password=nope"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"status": 401, "error": "invalid credentials"})
    );
}

#[actix_web::test]
async fn current_user_never_exposes_password_hash() {
    let mut users = MockUserService::new();
    users
        .expect_get()
        .withf(|claims, id| claims.sub == *id && *id == UserId::new(42))
        .times(1)
        .returning(|_, _| Ok(ada()));

    let response = call(
        with_users(users),
        bearer(TestRequest::get().uri("/user/me"), USER_TOKEN),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body,
        json!({"id": 42, "username": "ada", "email": "ada@example.com", "role": "user"})
    );
}

#[actix_web::test]
async fn list_users_uses_caller_claims() {
    let mut users = MockUserService::new();
    users
        .expect_list()
        .withf(|claims| !claims.admin)
        .times(1)
        .returning(|_| Ok(vec![ada()]));

    let response = call(
        with_users(users),
        bearer(TestRequest::get().uri("/user"), USER_TOKEN),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn update_me_applies_only_given_fields() {
    let mut users = MockUserService::new();
    users
        .expect_update()
        .withf(|_, id, update| {
            *id == UserId::new(42)
                && update.username.is_none()
                && update.password.is_none()
                && update.email
                    == Some(EmailAddress::new("ada@example.org").expect("email"))
        })
        .times(1)
        .returning(|_, _, update| {
            let mut user = ada();
            if let Some(email) = update.email {
                user.email = email;
            }
            Ok(user)
        });

    let response = call(
        with_users(users),
        bearer(TestRequest::put().uri("/user/me"), USER_TOKEN)
            .set_json(json!({"email": "ada@example.org"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["email"], json!("ada@example.org"));
}

#[rstest]
#[case::unknown_field(json!({"nickname": "ada"}))]
#[case::invalid_email(json!({"email": "not-an-email"}))]
#[case::short_password(json!({"password": "x"}))]
#[actix_web::test]
async fn invalid_update_bodies_are_bad_requests(#[case] body: serde_json::Value) {
    let mut users = MockUserService::new();
    users.expect_update().never();

    let response = call(
        with_users(users),
        bearer(TestRequest::put().uri("/user/me"), USER_TOKEN).set_json(body),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["status"], json!(400));
}

#[actix_web::test]
async fn taken_username_is_conflict() {
    let mut users = MockUserService::new();
    users
        .expect_update()
        .returning(|_, _, _| Err(Error::conflict("username is already taken")));

    let response = call(
        with_users(users),
        bearer(TestRequest::put().uri("/user/me"), USER_TOKEN)
            .set_json(json!({"username": "root"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn delete_me_returns_no_content() {
    let mut users = MockUserService::new();
    users
        .expect_delete()
        .withf(|_, id| *id == UserId::new(42))
        .times(1)
        .returning(|_, _| Ok(()));

    let response = call(
        with_users(users),
        bearer(TestRequest::delete().uri("/user/me"), USER_TOKEN),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn foreign_token_is_unauthorized() {
    let mut users = MockUserService::new();
    users.expect_get().never();

    let response = call(
        with_users(users),
        bearer(TestRequest::get().uri("/user/me"), "forged"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
