//! Port abstraction for bearer token issuance and verification.

use crate::domain::{IssuedToken, Principal};

use super::define_port_error;

define_port_error! {
    /// Token backend failures.
    pub enum TokenError {
        /// Token could not be signed.
        Signing { message: String } => "token signing failed: {message}",
        /// Token expired.
        Expired => "token expired",
        /// Token malformed, forged, or issued by someone else.
        Invalid { message: String } => "token invalid: {message}",
    }
}

/// Signs and verifies bearer tokens.
#[cfg_attr(test, mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    /// Issue a token for `principal`.
    fn issue(&self, principal: Principal) -> Result<IssuedToken, TokenError>;

    /// Verify a token and return the identity it carries.
    fn verify(&self, token: &str) -> Result<Principal, TokenError>;
}
