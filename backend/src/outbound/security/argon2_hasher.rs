//! Argon2id implementation of [`PasswordHasher`].

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use rand::RngCore as _;

use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// Argon2id with the crate's default cost parameters and a random 16-byte
/// salt per hash. Hashes are stored in PHC string form.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let mut salt_bytes = [0_u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|err| PasswordHashError::hash(err.to_string()))?;
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| PasswordHashError::hash(err.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        let parsed =
            PasswordHash::new(hash).map_err(|err| PasswordHashError::malformed(err.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn hashes_verify_only_the_original_password() {
        let hasher = Argon2PasswordHasher;
        let hash = hasher.hash("correct horse").expect("hash");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &hash).expect("verify"));
        assert!(!hasher.verify("battery staple", &hash).expect("verify"));
    }

    #[rstest]
    fn salts_differ_between_hashes() {
        let hasher = Argon2PasswordHasher;
        let first = hasher.hash("same password").expect("hash");
        let second = hasher.hash("same password").expect("hash");
        assert_ne!(first, second);
    }

    #[rstest]
    fn garbage_hash_is_malformed() {
        let err = Argon2PasswordHasher
            .verify("pw", "not-a-phc-string")
            .expect_err("malformed");
        assert!(matches!(err, PasswordHashError::Malformed { .. }));
    }
}
