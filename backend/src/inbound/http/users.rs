//! Login and self-service user handlers.
//!
//! ```text
//! GET    /login?username=ada&password=...
//! GET    /user
//! GET    /user/me
//! PUT    /user/me {"email":"ada@example.org"}
//! DELETE /user/me
//! ```

use actix_web::{HttpResponse, delete, get, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    EmailAddress, Error, LoginCredentials, Password, User, UserUpdate, UserValidationError,
    Username,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::{ErrorSchema, UserSchema};
use crate::inbound::http::state::HttpState;

/// Credentials for `GET /login`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginQuery {
    pub username: String,
    pub password: String,
}

/// Signed session token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Partial update body. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl TryFrom<UpdateUserRequest> for UserUpdate {
    type Error = UserValidationError;

    fn try_from(value: UpdateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            username: value.username.map(Username::new).transpose()?,
            email: value.email.map(EmailAddress::new).transpose()?,
            password: value.password.map(Password::new).transpose()?,
        })
    }
}

pub(crate) fn map_user_validation_error(err: UserValidationError) -> Error {
    Error::bad_request(err.to_string())
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    get,
    path = "/login",
    params(LoginQuery),
    responses(
        (status = 200, description = "Login success", body = TokenResponse),
        (status = 400, description = "Missing credentials", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[get("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    query: web::Query<LoginQuery>,
) -> ApiResult<web::Json<TokenResponse>> {
    let LoginQuery { username, password } = query.into_inner();
    let credentials = LoginCredentials::try_from_parts(&username, &password)
        .map_err(|err| Error::bad_request(err.to_string()))?;
    let token = state.auth.login(&credentials).await?;
    Ok(web::Json(TokenResponse { token }))
}

/// List every user.
#[utoipa::path(
    get,
    path = "/user",
    responses(
        (status = 200, description = "Users", body = [UserSchema]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/user")]
pub async fn list_users(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<Vec<User>>> {
    let users = state.users.list(auth.claims()).await?;
    Ok(web::Json(users))
}

/// Fetch the caller's own account.
#[utoipa::path(
    get,
    path = "/user/me",
    responses(
        (status = 200, description = "Current user", body = UserSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Account no longer exists", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getMe"
)]
#[get("/user/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<User>> {
    let claims = auth.claims();
    let user = state.users.get(claims, claims.sub).await?;
    Ok(web::Json(user))
}

/// Update the caller's username, email or password.
#[utoipa::path(
    put,
    path = "/user/me",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserSchema),
        (status = 400, description = "Invalid field", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Username or email taken", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateMe"
)]
#[put("/user/me")]
pub async fn update_current_user(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<User>> {
    let update = UserUpdate::try_from(payload.into_inner()).map_err(map_user_validation_error)?;
    let claims = auth.claims();
    let user = state.users.update(claims, claims.sub, update).await?;
    Ok(web::Json(user))
}

/// Delete the caller's account.
#[utoipa::path(
    delete,
    path = "/user/me",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Account no longer exists", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "deleteMe"
)]
#[delete("/user/me")]
pub async fn delete_current_user(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<HttpResponse> {
    let claims = auth.claims();
    state.users.delete(claims, claims.sub).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
