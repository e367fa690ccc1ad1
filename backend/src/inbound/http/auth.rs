//! Request authentication.
//!
//! API clients send `Authorization: Bearer <jwt>`; browsers carry a session
//! cookie set at login. Either way the handler receives a [`Principal`]
//! whose role is read fresh from storage.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, Principal, UserId};

use super::session::SessionContext;
use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Extractor requiring a signed-in caller; missing credentials yield 401.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Principal);

/// Extractor for endpoints that serve anonymous callers too. Credentials
/// that are present but invalid still yield 401.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthenticated(pub Option<Principal>);

enum Credential {
    Bearer(String),
    Session(UserId),
    Anonymous,
}

fn bearer_token(req: &HttpRequest) -> Result<Option<String>, Error> {
    let Some(header) = req.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("authorization header is not valid ASCII"))?;
    match value.strip_prefix(BEARER_PREFIX).map(str::trim) {
        Some(token) if !token.is_empty() => Ok(Some(token.to_owned())),
        _ => Err(Error::unauthorized("authorization header must be a bearer token")),
    }
}

fn credential(req: &HttpRequest) -> Result<Credential, Error> {
    if let Some(token) = bearer_token(req)? {
        return Ok(Credential::Bearer(token));
    }
    Ok(SessionContext::of(req)
        .user_id()?
        .map_or(Credential::Anonymous, Credential::Session))
}

fn resolve(req: &HttpRequest) -> LocalBoxFuture<'static, Result<Option<Principal>, Error>> {
    let state = req.app_data::<web::Data<HttpState>>().cloned();
    let credential = credential(req);
    Box::pin(async move {
        let credential = credential?;
        let Some(state) = state else {
            return Err(Error::internal("http state is not configured"));
        };
        match credential {
            Credential::Bearer(token) => state.accounts.authenticate_token(&token).await.map(Some),
            Credential::Session(user_id) => state.accounts.principal_for(user_id).await.map(Some),
            Credential::Anonymous => Ok(None),
        }
    })
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let fut = resolve(req);
        Box::pin(async move {
            fut.await?
                .map(Authenticated)
                .ok_or_else(|| Error::unauthorized("login required"))
        })
    }
}

impl FromRequest for MaybeAuthenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let fut = resolve(req);
        Box::pin(async move { fut.await.map(MaybeAuthenticated) })
    }
}
