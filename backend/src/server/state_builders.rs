//! Builders for the adapter state shared by every worker.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use khidma::domain::ports::{
    ApplicationRepository, BookingRepository, NotificationRepository, PaymentGateway,
    PaymentRepository, ReviewRepository, ServiceRepository, UserRepository,
};
use khidma::domain::{Locale, Registration};
use khidma::inbound::http::state::{HttpState, HttpStatePorts};
use khidma::inbound::ws::AllowedOrigins;
use khidma::inbound::ws::state::WsState;
use khidma::outbound::llm::build_language_model;
use khidma::outbound::memory::MemoryStore;
use khidma::outbound::notifications::NotificationHub;
use khidma::outbound::payments::{
    MockApplePayGateway, StripeCheckoutGateway, StripeWebhookVerifier, UnconfiguredGateway,
};
use khidma::outbound::persistence::{
    DbPool, DieselApplicationRepository, DieselBookingRepository, DieselNotificationRepository,
    DieselPaymentRepository, DieselReviewRepository, DieselServiceRepository,
    DieselUserRepository,
};
use khidma::outbound::security::{Argon2PasswordHasher, JwtTokenIssuer};
use khidma::settings::ServerSettings;

use super::ServerConfig;

/// One implementation per repository port.
struct Repositories {
    users: Arc<dyn UserRepository>,
    services: Arc<dyn ServiceRepository>,
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    reviews: Arc<dyn ReviewRepository>,
    notifications: Arc<dyn NotificationRepository>,
    applications: Arc<dyn ApplicationRepository>,
}

impl Repositories {
    fn diesel(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            services: Arc::new(DieselServiceRepository::new(pool.clone())),
            bookings: Arc::new(DieselBookingRepository::new(pool.clone())),
            payments: Arc::new(DieselPaymentRepository::new(pool.clone())),
            reviews: Arc::new(DieselReviewRepository::new(pool.clone())),
            notifications: Arc::new(DieselNotificationRepository::new(pool.clone())),
            applications: Arc::new(DieselApplicationRepository::new(pool.clone())),
        }
    }

    fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            services: store.clone(),
            bookings: store.clone(),
            payments: store.clone(),
            reviews: store.clone(),
            notifications: store.clone(),
            applications: store,
        }
    }

    fn for_config(config: &ServerConfig) -> Self {
        match &config.db_pool {
            Some(pool) => Self::diesel(pool),
            None => {
                warn!("no database configured; data lives in memory and is lost on restart");
                Self::memory()
            }
        }
    }
}

fn io_error(context: &str, error: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {error}"))
}

fn card_gateway(settings: &ServerSettings) -> std::io::Result<Arc<dyn PaymentGateway>> {
    match settings
        .stripe_checkout()
        .map_err(|err| io_error("invalid stripe settings", err))?
    {
        Some(stripe) => {
            let gateway = StripeCheckoutGateway::new(stripe)
                .map_err(|err| io_error("stripe client", err))?;
            Ok(Arc::new(gateway))
        }
        None => {
            warn!("stripe is not configured; card checkout is unavailable");
            Ok(Arc::new(UnconfiguredGateway))
        }
    }
}

fn webhook_verifier(settings: &ServerSettings) -> StripeWebhookVerifier {
    if let Some(secret) = settings.stripe_webhook_secret() {
        return StripeWebhookVerifier::new(secret);
    }
    warn!("stripe webhook secret missing; every webhook will be rejected");
    StripeWebhookVerifier::new(String::new())
}

/// Adapter state for the HTTP and WebSocket surfaces.
pub(crate) struct AppStates {
    pub(crate) http: HttpState,
    pub(crate) ws: WsState,
}

/// Compose every port implementation from `config`.
///
/// # Errors
///
/// Returns an error for unusable settings (missing JWT secret in release
/// builds, partial Stripe configuration, unknown LLM provider, malformed
/// WebSocket origins).
pub(crate) fn build_states(config: &ServerConfig) -> std::io::Result<AppStates> {
    let settings = &config.settings;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let jwt_secret = settings
        .jwt_secret()
        .ok_or_else(|| io_error("configuration", "KHIDMA_JWT_SECRET is required"))?;
    let llm = settings
        .llm()
        .map_err(|err| io_error("invalid llm settings", err))?;
    let language_model =
        build_language_model(&llm).map_err(|err| io_error("llm client", err))?;
    let origins = AllowedOrigins::parse(settings.ws_allowed_origins())
        .map_err(|err| io_error("configuration", err))?;
    let hub = NotificationHub::new();
    let repositories = Repositories::for_config(config);

    let ports = HttpStatePorts {
        users: repositories.users,
        services: repositories.services,
        bookings: repositories.bookings,
        payments: repositories.payments,
        reviews: repositories.reviews,
        notifications: repositories.notifications,
        applications: repositories.applications,
        hasher: Arc::new(Argon2PasswordHasher),
        tokens: Arc::new(JwtTokenIssuer::new(
            jwt_secret.as_bytes(),
            settings.jwt_ttl_secs(),
            clock.clone(),
        )),
        card_gateway: card_gateway(settings)?,
        apple_pay_gateway: Arc::new(MockApplePayGateway),
        webhooks: Arc::new(webhook_verifier(settings)),
        language_model,
        publisher: Arc::new(hub.clone()),
        clock,
    };
    let http = HttpState::new(ports, settings.currency())
        .map_err(|err| io_error("assistant patterns", err))?;
    let ws = WsState::new(Arc::new(hub), http.accounts.clone(), origins);
    Ok(AppStates { http, ws })
}

/// Create the configured administrator unless the account already exists.
///
/// # Errors
///
/// Returns an error when the credentials are invalid or storage fails.
pub(crate) async fn bootstrap_admin(
    settings: &ServerSettings,
    state: &HttpState,
) -> std::io::Result<()> {
    let Some(admin) = settings
        .admin()
        .map_err(|err| io_error("invalid admin settings", err))?
    else {
        return Ok(());
    };
    let registration = Registration::try_from_parts(
        &admin.email,
        &admin.password,
        &admin.display_name,
        Locale::En,
    )
    .map_err(|err| io_error("invalid admin credentials", err))?;
    let created = state
        .accounts
        .ensure_admin(registration)
        .await
        .map_err(|err| io_error("admin bootstrap", err))?;
    if let Some(user) = created {
        info!(user_id = %user.id, "created bootstrap administrator");
    }
    Ok(())
}
