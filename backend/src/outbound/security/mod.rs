//! Credential hashing and session token adapters.

mod bcrypt_hasher;
mod jwt_codec;

pub use bcrypt_hasher::BcryptPasswordHasher;
pub use jwt_codec::JwtTokenCodec;
