//! Port for signing and verifying session tokens.

use crate::domain::Claims;

use super::define_port_error;

define_port_error! {
    /// Errors raised by token codecs.
    pub enum TokenError {
        /// The token could not be signed.
        Encode { message: String } => "token signing failed: {message}",
        /// The token is malformed or its signature does not verify.
        Invalid { message: String } => "token is invalid: {message}",
        /// The token verified but its expiry has passed.
        Expired => "token has expired",
    }
}

/// Symmetric signing of [`Claims`].
#[cfg_attr(test, mockall::automock)]
pub trait TokenCodec: Send + Sync {
    /// Sign claims into a compact token string.
    fn encode(&self, claims: &Claims) -> Result<String, TokenError>;

    /// Verify signature and expiry, returning the embedded claims.
    fn decode(&self, token: &str) -> Result<Claims, TokenError>;
}
