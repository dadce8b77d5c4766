//! HS256 JSON Web Token implementation of the `TokenCodec` port.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{TokenCodec, TokenError};
use crate::domain::{Claims, UserId};

/// Registered claim layout on the wire. `sub` is a string per RFC 7519.
#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    admin: bool,
    exp: i64,
    iat: i64,
}

impl From<&Claims> for WireClaims {
    fn from(claims: &Claims) -> Self {
        Self {
            sub: claims.sub.get().to_string(),
            admin: claims.admin,
            exp: claims.exp,
            iat: claims.iat,
        }
    }
}

impl TryFrom<WireClaims> for Claims {
    type Error = TokenError;

    fn try_from(wire: WireClaims) -> Result<Self, Self::Error> {
        let id = wire
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::invalid("subject is not a user id"))?;
        Ok(Self {
            sub: UserId::new(id),
            admin: wire.admin,
            exp: wire.exp,
            iat: wire.iat,
        })
    }
}

/// Symmetric token codec keyed by a shared secret.
pub struct JwtTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtTokenCodec {
    /// Create a codec signing with `secret`.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl TokenCodec for JwtTokenCodec {
    fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(
            &Header::new(Algorithm::HS256),
            &WireClaims::from(claims),
            &self.encoding,
        )
        .map_err(|err| TokenError::encode(err.to_string()))
    }

    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<WireClaims>(token, &self.decoding, &self.validation).map_err(
            |err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::expired(),
                _ => TokenError::invalid(err.to_string()),
            },
        )?;
        Claims::try_from(data.claims)
    }
}
