//! Port abstraction for password hashing.

use super::define_port_error;

define_port_error! {
    /// Hashing backend failures.
    pub enum PasswordHashError {
        /// Hash could not be produced.
        Hash { message: String } => "password hashing failed: {message}",
        /// Stored hash is not in a recognised format.
        Malformed { message: String } => "stored password hash is malformed: {message}",
    }
}

/// One-way password hashing.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing hash of `password`.
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Check `password` against a hash produced by [`Self::hash`].
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError>;
}
