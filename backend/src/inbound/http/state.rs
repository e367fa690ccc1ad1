//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data`. The state owns
//! the composed domain services; the services only see ports, so handlers
//! stay testable against the in-memory store and mocks.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    ApplicationRepository, BookingRepository, LanguageModel, NotificationPublisher,
    NotificationRepository, PasswordHasher, PaymentGateway, PaymentRepository, ReviewRepository,
    ServiceRepository, TokenIssuer, UserRepository, WebhookVerifier,
};
use crate::domain::{
    AccountService, AdminService, ApplicationService, AssistantService, BookingService,
    CatalogueService, NotificationService, PaymentGateways, PaymentService, ReviewService,
};

/// Parameter object bundling every port implementation the services need.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UserRepository>,
    pub services: Arc<dyn ServiceRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenIssuer>,
    pub card_gateway: Arc<dyn PaymentGateway>,
    pub apple_pay_gateway: Arc<dyn PaymentGateway>,
    pub webhooks: Arc<dyn WebhookVerifier>,
    pub language_model: Arc<dyn LanguageModel>,
    pub publisher: Arc<dyn NotificationPublisher>,
    pub clock: Arc<dyn Clock>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: AccountService,
    pub catalogue: CatalogueService,
    pub bookings: BookingService,
    pub payments: PaymentService,
    pub reviews: ReviewService,
    pub notifications: NotificationService,
    pub applications: ApplicationService,
    pub admin: AdminService,
    pub assistant: AssistantService,
    /// Currency applied to listings that do not name one.
    pub default_currency: String,
}

impl HttpState {
    /// Compose the domain services from `ports`.
    ///
    /// # Errors
    ///
    /// Returns the regex error if a built-in assistant pattern fails to
    /// compile.
    pub fn new(
        ports: HttpStatePorts,
        default_currency: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        let HttpStatePorts {
            users,
            services,
            bookings,
            payments,
            reviews,
            notifications,
            applications,
            hasher,
            tokens,
            card_gateway,
            apple_pay_gateway,
            webhooks,
            language_model,
            publisher,
            clock,
        } = ports;

        let notification_service = NotificationService::new(notifications, publisher, clock.clone());
        let catalogue = CatalogueService::new(services, clock.clone());
        let booking_service = BookingService::new(
            bookings.clone(),
            payments.clone(),
            catalogue.clone(),
            notification_service.clone(),
            clock.clone(),
        );
        let payment_service = PaymentService::new(
            payments,
            bookings.clone(),
            catalogue.clone(),
            PaymentGateways {
                card: card_gateway,
                apple_pay: apple_pay_gateway,
            },
            webhooks,
            notification_service.clone(),
            clock.clone(),
        );
        let review_service = ReviewService::new(
            reviews,
            bookings,
            catalogue.clone(),
            notification_service.clone(),
            clock.clone(),
        );
        let application_service =
            ApplicationService::new(applications, notification_service.clone(), clock.clone());
        let admin = AdminService::new(
            users.clone(),
            catalogue.clone(),
            booking_service.clone(),
            payment_service.clone(),
            notification_service.clone(),
        );
        let assistant = AssistantService::new(
            catalogue.clone(),
            booking_service.clone(),
            language_model,
            clock.clone(),
        )?;
        let accounts = AccountService::new(users, hasher, tokens, clock);

        Ok(Self {
            accounts,
            catalogue,
            bookings: booking_service,
            payments: payment_service,
            reviews: review_service,
            notifications: notification_service,
            applications: application_service,
            admin,
            assistant,
            default_currency: default_currency.into(),
        })
    }
}
