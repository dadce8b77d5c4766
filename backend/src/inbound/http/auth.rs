//! Bearer token extractor.
//!
//! Handlers that take [`Authenticated`] only run once the
//! `Authorization: Bearer <token>` header has been verified; the resulting
//! [`Claims`] are then passed explicitly to the domain services.

use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::{Ready, ready};

use crate::domain::{Claims, Error};
use crate::inbound::http::state::HttpState;

/// Verified caller identity.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Claims);

impl Authenticated {
    /// Claims extracted from the token.
    pub fn claims(&self) -> &Claims {
        &self.0
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, Error> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| Error::unauthorized("malformed authorization header"))?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(Error::unauthorized("malformed authorization header"));
    }
    Ok(token)
}

fn authenticate(req: &HttpRequest) -> Result<Authenticated, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("http state is not configured"))?;
    let token = bearer_token(req.headers())?;
    state.auth.authorize(token).map(Authenticated)
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;
    use rstest::rstest;

    fn headers(value: Option<&'static str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(value) = value {
            map.insert(AUTHORIZATION, HeaderValue::from_static(value));
        }
        map
    }

    #[rstest]
    #[case("Bearer abc.def.ghi", "abc.def.ghi")]
    #[case("bearer   abc.def.ghi ", "abc.def.ghi")]
    fn extracts_bearer_token(#[case] header: &'static str, #[case] expected: &str) {
        assert_eq!(bearer_token(&headers(Some(header))).expect("token"), expected);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("Basic dXNlcjpwYXNz"))]
    #[case(Some("Bearer"))]
    #[case(Some("Bearer   "))]
    fn rejects_missing_or_foreign_schemes(#[case] header: Option<&'static str>) {
        let err = bearer_token(&headers(header)).expect_err("rejected");
        assert_eq!(err.code(), crate::domain::ErrorCode::Unauthorized);
    }
}
