//! Shared wiring for the HTTP integration suite.
//!
//! Every test gets a fresh in-memory store, real Argon2 hashing and JWT
//! tokens, the simulated Apple Pay gateway and no language model.

use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::Key;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{Method, StatusCode, header};
use actix_web::test as actix_test;
use mockable::DefaultClock;
use serde_json::Value;

use khidma::domain::ports::DisabledLanguageModel;
use khidma::domain::{Locale, Registration};
use khidma::inbound::http::state::{HttpState, HttpStatePorts};
use khidma::outbound::memory::MemoryStore;
use khidma::outbound::notifications::NotificationHub;
use khidma::outbound::payments::{MockApplePayGateway, StripeWebhookVerifier, UnconfiguredGateway};
use khidma::outbound::security::{Argon2PasswordHasher, JwtTokenIssuer};

pub const WEBHOOK_SECRET: &str = "whsec_integration";
pub const ADMIN_EMAIL: &str = "admin@khidma.example";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// Compose the HTTP state over a fresh memory store.
pub fn build_state() -> HttpState {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(DefaultClock);
    let ports = HttpStatePorts {
        users: store.clone(),
        services: store.clone(),
        bookings: store.clone(),
        payments: store.clone(),
        reviews: store.clone(),
        notifications: store.clone(),
        applications: store,
        hasher: Arc::new(Argon2PasswordHasher),
        tokens: Arc::new(JwtTokenIssuer::new(b"integration-secret", 3600, clock.clone())),
        card_gateway: Arc::new(UnconfiguredGateway),
        apple_pay_gateway: Arc::new(MockApplePayGateway),
        webhooks: Arc::new(StripeWebhookVerifier::new(WEBHOOK_SECRET)),
        language_model: Arc::new(DisabledLanguageModel),
        publisher: Arc::new(NotificationHub::new()),
        clock,
    };
    HttpState::new(ports, "SAR").expect("assistant patterns compile")
}

/// Create the bootstrap administrator.
pub async fn seed_admin(state: &HttpState) {
    let registration =
        Registration::try_from_parts(ADMIN_EMAIL, ADMIN_PASSWORD, "Admin", Locale::En)
            .expect("valid admin");
    state
        .accounts
        .ensure_admin(registration)
        .await
        .expect("admin bootstrap")
        .expect("admin created");
}

pub fn session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Initialise the full `/api/v1` surface around `$state`.
#[macro_export]
macro_rules! api_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state))
                .wrap($crate::support::session_middleware())
                .wrap(khidma::Trace)
                .configure(khidma::inbound::http::configure_api),
        )
        .await
    };
}

/// Send a request and decode the JSON body (`Null` when empty).
pub async fn send<S, B>(
    app: &S,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let mut request = actix_test::TestRequest::default().method(method).uri(uri);
    if let Some(token) = token {
        request = request.insert_header((header::AUTHORIZATION, format!("Bearer {token}")));
    }
    if let Some(body) = body {
        request = request.set_json(body);
    }
    let response = actix_test::call_service(app, request.to_request()).await;
    let status = response.status();
    let bytes = actix_test::read_body(response).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

/// Register an account and return its bearer token.
pub async fn register_and_login<S, B>(app: &S, email: &str, name: &str, locale: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, _) = send(
        app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "correct-horse",
            "displayName": name,
            "locale": locale,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register {email}");
    login(app, email, "correct-horse").await
}

pub async fn login<S, B>(app: &S, email: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(serde_json::json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login {email}");
    body["token"].as_str().expect("token").to_owned()
}
