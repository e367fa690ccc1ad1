//! Credential adapters: Argon2 password hashing and HS256 bearer tokens.

mod argon2_hasher;
mod jwt_issuer;

pub use argon2_hasher::Argon2PasswordHasher;
pub use jwt_issuer::{DEFAULT_TOKEN_TTL_SECS, JwtTokenIssuer, TOKEN_ISSUER};
