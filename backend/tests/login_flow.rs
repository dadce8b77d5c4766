//! Login over HTTP and the claims carried by the issued token.

mod support;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use rstest::rstest;
use rubus_api::domain::ports::TokenCodec;
use rubus_api::domain::Role;
use rubus_api::outbound::security::JwtTokenCodec;
use serde_json::json;

use support::{Harness, JWT_SECRET, bearer, json_body};

#[rstest]
#[case::standard("ada", Role::User, false)]
#[case::administrator("root", Role::Administrator, true)]
#[actix_web::test]
async fn token_claims_carry_subject_and_role(
    #[case] username: &str,
    #[case] role: Role,
    #[case] admin: bool,
) {
    let harness = Harness::empty();
    let user = harness.create_user(username, role).await;

    let token = harness.login(username).await;
    let claims = JwtTokenCodec::new(JWT_SECRET)
        .decode(&token)
        .expect("token decodes with the server secret");

    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.admin, admin);
    assert!(claims.exp > claims.iat);
}

#[rstest]
#[case::unknown_user("/login?username=nobody&password=rubus_secret")]
#[case::wrong_password("/login?username=ada&password=not-the-password")]
#[actix_web::test]
async fn failed_logins_look_identical(#[case] uri: &str) {
    let harness = Harness::empty();
    harness.create_user("ada", Role::User).await;

    let response = harness.call(TestRequest::get().uri(uri)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"status": 401, "error": "invalid credentials"})
    );
}

#[rstest]
#[actix_web::test]
async fn token_from_another_secret_is_rejected() {
    let harness = Harness::empty();
    let user = harness.create_user("ada", Role::User).await;
    let forged = JwtTokenCodec::new(b"some-other-secret")
        .encode(&rubus_api::test_support::claims_for(user.id.get(), true))
        .expect("encodes");

    let response = harness
        .call(bearer(TestRequest::get().uri("/user/me"), &forged))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn self_service_round_trip() {
    let harness = Harness::empty();
    let user = harness.create_user("ada", Role::User).await;
    let token = harness.login("ada").await;

    let me = harness
        .call(bearer(TestRequest::get().uri("/user/me"), &token))
        .await;
    assert_eq!(me.status(), StatusCode::OK);
    let body = json_body(me).await;
    assert_eq!(body["id"], json!(user.id.get()));
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());

    let updated = harness
        .call(
            bearer(TestRequest::put().uri("/user/me"), &token)
                .set_json(json!({"email": "ada@example.org"})),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(json_body(updated).await["email"], json!("ada@example.org"));

    let deleted = harness
        .call(bearer(TestRequest::delete().uri("/user/me"), &token))
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let relogin = harness
        .call(TestRequest::get().uri("/login?username=ada&password=rubus_secret"))
        .await;
    assert_eq!(relogin.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn padded_username_from_admin_can_log_in() {
    let harness = Harness::empty();
    harness.create_user("root", Role::Administrator).await;
    let admin = harness.login("root").await;

    let created = harness
        .call(
            bearer(TestRequest::post().uri("/admin/user"), &admin).set_json(json!({
                "username": " ada ",
                "email": "ada@example.com",
                "password": "rubus_secret",
            })),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(json_body(created).await["username"], json!("ada"));

    let login = harness
        .call(TestRequest::get().uri("/login?username=%20ada%20&password=rubus_secret"))
        .await;
    assert_eq!(login.status(), StatusCode::OK);
}
