//! Tests for the user account service.

use super::*;
use crate::domain::ports::{FixturePasswordHasher, MockUserRepository};
use crate::domain::{EmailAddress, ErrorCode, Password, Username};
use crate::test_support::{InMemoryUserRepository, claims_for};
use chrono::TimeZone;
use chrono::Utc;
use rstest::{fixture, rstest};

type Service = UserAccountService<InMemoryUserRepository, FixturePasswordHasher>;

#[fixture]
fn repo() -> Arc<InMemoryUserRepository> {
    Arc::new(InMemoryUserRepository::default())
}

fn service(repo: &Arc<InMemoryUserRepository>) -> Service {
    UserAccountService::new(Arc::clone(repo), Arc::new(FixturePasswordHasher))
}

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser::try_from_parts(username, email, "correct horse", None).expect("valid user")
}

#[rstest]
#[tokio::test]
async fn create_then_get_never_exposes_plaintext(repo: Arc<InMemoryUserRepository>) {
    let service = service(&repo);
    let admin = claims_for(1, true);

    let created = service
        .create(&admin, new_user("ada", "ada@example.com"))
        .await
        .expect("create succeeds");
    let fetched = service.get(&admin, created.id).await.expect("get succeeds");

    assert_eq!(created, fetched);
    let hash = repo.password_hash(created.id).expect("hash stored");
    assert_ne!(hash, "correct horse");
    let body = serde_json::to_string(&fetched).expect("serialise");
    assert!(!body.contains(&hash));
    assert!(!body.contains("correct horse"));
}

#[rstest]
#[case("ada", "other@example.com")]
#[case("other", "ada@example.com")]
#[tokio::test]
async fn duplicate_username_or_email_conflicts(
    repo: Arc<InMemoryUserRepository>,
    #[case] username: &str,
    #[case] email: &str,
) {
    let service = service(&repo);
    let admin = claims_for(1, true);
    service
        .create(&admin, new_user("ada", "ada@example.com"))
        .await
        .expect("first create succeeds");

    let err = service
        .create(&admin, new_user(username, email))
        .await
        .expect_err("duplicate rejected");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn non_admin_cannot_create(repo: Arc<InMemoryUserRepository>) {
    let err = service(&repo)
        .create(&claims_for(2, false), new_user("ada", "ada@example.com"))
        .await
        .expect_err("rejected");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn update_overwrites_only_supplied_fields(repo: Arc<InMemoryUserRepository>) {
    let service = service(&repo);
    let created = service
        .create(&claims_for(1, true), new_user("ada", "ada@example.com"))
        .await
        .expect("create");
    let before = repo.password_hash(created.id).expect("hash");

    let update = UserUpdate {
        email: Some(EmailAddress::new("lovelace@example.com").expect("email")),
        ..UserUpdate::default()
    };
    let updated = service
        .update(&claims_for(created.id.get(), false), created.id, update)
        .await
        .expect("self update");

    assert_eq!(updated.username, created.username);
    assert_eq!(updated.email.as_ref(), "lovelace@example.com");
    assert_eq!(repo.password_hash(created.id), Some(before));
}

#[rstest]
#[tokio::test]
async fn update_rehashes_new_password(repo: Arc<InMemoryUserRepository>) {
    let service = service(&repo);
    let created = service
        .create(&claims_for(1, true), new_user("ada", "ada@example.com"))
        .await
        .expect("create");

    let update = UserUpdate {
        password: Some(Password::new("another secret").expect("password")),
        ..UserUpdate::default()
    };
    service
        .update(&claims_for(1, true), created.id, update)
        .await
        .expect("admin update");

    assert_eq!(
        repo.password_hash(created.id).as_deref(),
        Some("fixture$another secret")
    );
}

#[rstest]
#[tokio::test]
async fn update_into_taken_username_conflicts(repo: Arc<InMemoryUserRepository>) {
    let service = service(&repo);
    let admin = claims_for(1, true);
    service
        .create(&admin, new_user("ada", "ada@example.com"))
        .await
        .expect("create");
    let grace = service
        .create(&admin, new_user("grace", "grace@example.com"))
        .await
        .expect("create");

    let update = UserUpdate {
        username: Some(Username::new("ada").expect("username")),
        ..UserUpdate::default()
    };
    let err = service
        .update(&admin, grace.id, update)
        .await
        .expect_err("collision");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn other_users_cannot_read_or_delete(repo: Arc<InMemoryUserRepository>) {
    let service = service(&repo);
    let created = service
        .create(&claims_for(1, true), new_user("ada", "ada@example.com"))
        .await
        .expect("create");
    let stranger = claims_for(created.id.get() + 100, false);

    let get = service.get(&stranger, created.id).await.expect_err("denied");
    let delete = service
        .delete(&stranger, created.id)
        .await
        .expect_err("denied");
    assert_eq!(get.code(), ErrorCode::Unauthorized);
    assert_eq!(delete.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn deleting_missing_user_is_not_found(repo: Arc<InMemoryUserRepository>) {
    let err = service(&repo)
        .delete(&claims_for(1, true), UserId::new(99))
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn expiration_is_set_at_midnight_utc(repo: Arc<InMemoryUserRepository>) {
    let service = service(&repo);
    let admin = claims_for(1, true);
    let created = service
        .create(&admin, new_user("ada", "ada@example.com"))
        .await
        .expect("create");

    let date = NaiveDate::from_ymd_opt(2030, 6, 1).expect("date");
    let updated = service
        .set_expiration(&admin, created.id, Some(date))
        .await
        .expect("set expiration");

    let expected = Utc.with_ymd_and_hms(2030, 6, 1, 0, 0, 0).single();
    assert_eq!(updated.expiration, expected);
}

#[rstest]
#[tokio::test]
async fn ensure_admin_seeds_once(repo: Arc<InMemoryUserRepository>) {
    let service = service(&repo);
    let seed = || NewUser::try_from_parts("admin", "admin@mail.com", "rubus_secret", None);

    let first = service
        .ensure_admin(seed().expect("seed"))
        .await
        .expect("seed succeeds");
    let second = service
        .ensure_admin(seed().expect("seed"))
        .await
        .expect("seed is idempotent");

    let admin = first.expect("admin created");
    assert!(admin.is_admin());
    assert!(second.is_none());
}

#[rstest]
#[tokio::test]
async fn connection_failures_surface_as_internal_errors() {
    let mut repo = MockUserRepository::new();
    repo.expect_list()
        .times(1)
        .returning(|| Err(UserPersistenceError::connection("refused")));
    let service = UserAccountService::new(Arc::new(repo), Arc::new(FixturePasswordHasher));

    let err = service
        .list(&claims_for(1, false))
        .await
        .expect_err("failure");
    assert_eq!(err.code(), ErrorCode::InternalError);
}
