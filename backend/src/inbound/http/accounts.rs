//! Account endpoints: registration, login, logout and the caller's profile.
//!
//! ```text
//! POST /api/v1/auth/register {"email":"layla@example.com","password":"...","displayName":"Layla"}
//! POST /api/v1/auth/login {"email":"layla@example.com","password":"..."}
//! GET /api/v1/users/me
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    CredentialsValidationError, DisplayName, Error, Locale, LoginCredentials, PhoneNumber,
    ProfileUpdate, Registration, User, invalid_value,
};

use super::ApiResult;
use super::auth::Authenticated;
use super::session::SessionContext;
use super::state::HttpState;

/// Registration body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    /// `en` (default) or `ar`.
    #[serde(default)]
    pub locale: Option<String>,
}

/// Login body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login result: a bearer token for API clients plus the account.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub user: User,
}

/// Profile edit. Absent fields are unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub display_name: Option<String>,
    pub locale: Option<String>,
    pub phone: Option<String>,
}

fn credentials_error(err: CredentialsValidationError) -> Error {
    invalid_value(err.field(), err)
}

fn parse_locale(raw: Option<&str>) -> Result<Option<Locale>, Error> {
    raw.map(|value| {
        Locale::parse(value).ok_or_else(|| invalid_value("locale", "locale must be `en` or `ar`"))
    })
    .transpose()
}

impl TryFrom<ProfileRequest> for ProfileUpdate {
    type Error = Error;

    fn try_from(value: ProfileRequest) -> Result<Self, Self::Error> {
        let display_name = value
            .display_name
            .map(DisplayName::new)
            .transpose()
            .map_err(|err| invalid_value("displayName", err))?;
        let phone = value
            .phone
            .map(PhoneNumber::new)
            .transpose()
            .map_err(|err| invalid_value("phone", err))?;
        Ok(Self {
            display_name,
            locale: parse_locale(value.locale.as_deref())?,
            phone,
        })
    }
}

/// Create a client account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 429, description = "Rate limited", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let locale = parse_locale(body.locale.as_deref())?.unwrap_or_default();
    let registration =
        Registration::try_from_parts(&body.email, &body.password, &body.display_name, locale)
            .map_err(credentials_error)?;
    let user = state.accounts.register(registration).await?;
    Ok(HttpResponse::Created().json(user))
}

/// Check credentials, issue a bearer token and establish the cookie session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 429, description = "Rate limited", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let credentials = LoginCredentials::try_from_parts(&payload.email, &payload.password)
        .map_err(credentials_error)?;
    let outcome = state.accounts.login(&credentials).await?;
    session.sign_in(&outcome.user.id)?;
    Ok(web::Json(LoginResponse {
        token: outcome.token.token,
        expires_in: outcome.token.expires_in,
        user: outcome.user,
    }))
}

/// Drop the cookie session. Bearer tokens stay valid until they expire.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["accounts"],
    operation_id = "logout"
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.sign_out();
    HttpResponse::NoContent().finish()
}

/// Current account.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current account", body = User),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
) -> ApiResult<web::Json<User>> {
    state.accounts.me(principal.user_id).await.map(web::Json)
}

/// Edit the current account.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Updated account", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "updateCurrentUser"
)]
#[patch("/users/me")]
pub async fn update_current_user(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    payload: web::Json<ProfileRequest>,
) -> ApiResult<web::Json<User>> {
    let update = ProfileUpdate::try_from(payload.into_inner())?;
    state
        .accounts
        .update_profile(principal.user_id, update)
        .await
        .map(web::Json)
}
