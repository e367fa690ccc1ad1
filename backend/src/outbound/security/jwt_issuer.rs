//! HS256 bearer tokens via `jsonwebtoken`.
//!
//! Expiry is checked against the injected clock rather than the library's
//! wall-clock check, so token lifetimes follow the same clock as the rest of
//! the domain.

use std::str::FromStr;
use std::sync::Arc;

use chrono::TimeDelta;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ports::{TokenError, TokenIssuer};
use crate::domain::{IssuedToken, Principal, Role, UserId};

/// `iss` claim stamped on every token.
pub const TOKEN_ISSUER: &str = "khidma";

/// Token lifetime when none is configured (24 hours).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    iat: i64,
    exp: i64,
    iss: String,
    jti: String,
}

/// Signs and verifies HS256 tokens with a shared secret.
pub struct JwtTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl JwtTokenIssuer {
    /// Build an issuer from `secret` with tokens valid for `ttl_secs`.
    pub fn new(secret: &[u8], ttl_secs: i64, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: TimeDelta::seconds(ttl_secs),
            clock,
        }
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, principal: Principal) -> Result<IssuedToken, TokenError> {
        let now = self.clock.utc();
        let claims = Claims {
            sub: principal.user_id.to_string(),
            role: principal.role.as_str().to_owned(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            iss: TOKEN_ISSUER.to_owned(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::signing(err.to_string()))?;
        Ok(IssuedToken {
            token,
            expires_in: self.ttl.num_seconds(),
        })
    }

    fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::expired(),
                _ => TokenError::invalid(err.to_string()),
            }
        })?;
        let claims = data.claims;
        if claims.exp <= self.clock.utc().timestamp() {
            return Err(TokenError::expired());
        }
        let user_id =
            UserId::new(&claims.sub).map_err(|err| TokenError::invalid(err.to_string()))?;
        let role =
            Role::from_str(&claims.role).map_err(|err| TokenError::invalid(err.to_string()))?;
        Ok(Principal { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MutableClock, fixture_now};
    use rstest::{fixture, rstest};

    struct Harness {
        clock: Arc<MutableClock>,
        issuer: JwtTokenIssuer,
    }

    #[fixture]
    fn harness() -> Harness {
        let clock = Arc::new(MutableClock::new(fixture_now()));
        let issuer = JwtTokenIssuer::new(b"test-secret", 3600, clock.clone());
        Harness { clock, issuer }
    }

    fn principal() -> Principal {
        Principal {
            user_id: UserId::random(),
            role: Role::Provider,
        }
    }

    #[rstest]
    fn issued_tokens_verify_to_the_same_principal(harness: Harness) {
        let who = principal();
        let issued = harness.issuer.issue(who).expect("issue");

        assert_eq!(issued.expires_in, 3600);
        assert_eq!(harness.issuer.verify(&issued.token).expect("verify"), who);
    }

    #[rstest]
    fn tokens_expire_on_the_injected_clock(harness: Harness) {
        let issued = harness.issuer.issue(principal()).expect("issue");
        harness.clock.advance_seconds(3601);

        let err = harness.issuer.verify(&issued.token).expect_err("expired");
        assert_eq!(err, TokenError::expired());
    }

    #[rstest]
    fn tokens_signed_with_another_secret_are_invalid(harness: Harness) {
        let other = JwtTokenIssuer::new(b"other-secret", 3600, harness.clock.clone());
        let issued = other.issue(principal()).expect("issue");

        let err = harness.issuer.verify(&issued.token).expect_err("forged");
        assert!(matches!(err, TokenError::Invalid { .. }));
    }

    #[rstest]
    #[case("")]
    #[case("not.a.token")]
    fn garbage_is_invalid(harness: Harness, #[case] token: &str) {
        let err = harness.issuer.verify(token).expect_err("garbage");
        assert!(matches!(err, TokenError::Invalid { .. }));
    }
}
