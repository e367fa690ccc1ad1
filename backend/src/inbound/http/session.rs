//! Cookie-session access for browser clients.
//!
//! Login stores the account id under a single key; every other handler reads
//! it back through [`SessionContext::user_id`]. A cookie holding something
//! that is not a user id is treated as signed out and purged.

use actix_session::{Session, SessionExt};
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};
use tracing::warn;

use crate::domain::{Error, UserId};

const SIGNED_IN_AS: &str = "signed_in_as";

/// Browser session bound to the current request.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Session attached to `req` by the session middleware.
    pub fn of(req: &HttpRequest) -> Self {
        Self(req.get_session())
    }

    /// Record a successful login, rotating the session id first.
    pub fn sign_in(&self, user: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(SIGNED_IN_AS, user.to_string())
            .map_err(|err| Error::internal(format!("session write failed: {err}")))
    }

    /// Account id stored at login, if the cookie carries one.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let stored = self
            .0
            .get::<String>(SIGNED_IN_AS)
            .map_err(|err| Error::internal(format!("session read failed: {err}")))?;
        let Some(raw) = stored else {
            return Ok(None);
        };
        match UserId::new(&raw) {
            Ok(id) => Ok(Some(id)),
            Err(error) => {
                warn!(%error, "discarding session with malformed account id");
                self.0.purge();
                Ok(None)
            }
        }
    }

    /// Sign out: forget every value and expire the cookie.
    pub fn sign_out(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self::of(req)))
    }
}
