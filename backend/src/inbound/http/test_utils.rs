//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;

use crate::domain::ports::{
    DisabledLanguageModel, LanguageModel, PasswordHashError, PasswordHasher, PaymentGateway,
    TokenIssuer, UserRepository,
};
use crate::domain::{Principal, Role, StoredUser, User};
use crate::outbound::memory::MemoryStore;
use crate::outbound::notifications::NotificationHub;
use crate::outbound::payments::{MockApplePayGateway, StripeWebhookVerifier, UnconfiguredGateway};
use crate::outbound::security::JwtTokenIssuer;
use crate::test_support::{fixed_clock, sample_user};

use super::state::{HttpState, HttpStatePorts};

/// Webhook signing secret used by [`TestHarness`].
pub const WEBHOOK_SECRET: &str = "whsec_test";
const JWT_SECRET: &[u8] = b"test-jwt-secret";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Reversible "hash" so handler tests skip Argon2.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        Ok(hash.strip_prefix("plain:") == Some(password))
    }
}

/// In-memory wiring of every port with a frozen clock.
pub struct TestHarness {
    pub store: MemoryStore,
    pub hub: NotificationHub,
    pub tokens: Arc<JwtTokenIssuer>,
    pub state: HttpState,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_ports(Arc::new(UnconfiguredGateway), Arc::new(DisabledLanguageModel))
    }

    /// Harness with a specific card gateway and language model.
    pub fn with_ports(
        card_gateway: Arc<dyn PaymentGateway>,
        language_model: Arc<dyn LanguageModel>,
    ) -> Self {
        let store = MemoryStore::new();
        let hub = NotificationHub::new();
        let clock = fixed_clock();
        let tokens = Arc::new(JwtTokenIssuer::new(JWT_SECRET, 3600, clock.clone()));
        let store_arc = Arc::new(store.clone());
        let ports = HttpStatePorts {
            users: store_arc.clone(),
            services: store_arc.clone(),
            bookings: store_arc.clone(),
            payments: store_arc.clone(),
            reviews: store_arc.clone(),
            notifications: store_arc.clone(),
            applications: store_arc,
            hasher: Arc::new(PlainHasher),
            tokens: tokens.clone(),
            card_gateway,
            apple_pay_gateway: Arc::new(MockApplePayGateway),
            webhooks: Arc::new(StripeWebhookVerifier::new(WEBHOOK_SECRET)),
            language_model,
            publisher: Arc::new(hub.clone()),
            clock,
        };
        let state = HttpState::new(ports, "SAR").expect("assistant patterns compile");
        Self {
            store,
            hub,
            tokens,
            state,
        }
    }

    /// Persist an account with `role` and return it with a bearer token.
    pub async fn seed_user(&self, role: Role) -> (User, String) {
        let mut user = sample_user(role);
        user.email = crate::domain::Email::new(format!("{}@example.com", user.id))
            .expect("email");
        UserRepository::create(
            &self.store,
            &StoredUser {
                user: user.clone(),
                password_hash: "plain:password1".to_owned(),
            },
        )
        .await
        .expect("seed user");
        let token = self
            .tokens
            .issue(Principal {
                user_id: user.id,
                role,
            })
            .expect("token")
            .token;
        (user, token)
    }
}

/// `Authorization` header value for `token`.
pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (
        actix_web::http::header::AUTHORIZATION,
        format!("Bearer {token}"),
    )
}
