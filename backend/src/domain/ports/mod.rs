//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod application_repository;
mod booking_repository;
mod language_model;
mod notification_publisher;
mod notification_repository;
mod password_hasher;
mod payment_gateway;
mod payment_repository;
mod repository_error;
mod review_repository;
mod service_repository;
mod token_issuer;
mod user_repository;

pub use application_repository::ApplicationRepository;
#[cfg(test)]
pub use application_repository::MockApplicationRepository;
pub use booking_repository::BookingRepository;
#[cfg(test)]
pub use booking_repository::MockBookingRepository;
#[cfg(test)]
pub use language_model::MockLanguageModel;
pub use language_model::{ChatPrompt, DisabledLanguageModel, LanguageModel, LanguageModelError};
#[cfg(test)]
pub use notification_publisher::MockNotificationPublisher;
pub use notification_publisher::{NotificationFeed, NotificationPublisher};
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::NotificationRepository;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use payment_gateway::{MockPaymentGateway, MockWebhookVerifier};
pub use payment_gateway::{
    CheckoutRequest, PaymentGateway, PaymentGatewayError, WebhookError, WebhookVerifier,
};
#[cfg(test)]
pub use payment_repository::MockPaymentRepository;
pub use payment_repository::PaymentRepository;
pub use repository_error::RepositoryError;
#[cfg(test)]
pub use review_repository::MockReviewRepository;
pub use review_repository::ReviewRepository;
#[cfg(test)]
pub use service_repository::MockServiceRepository;
pub use service_repository::ServiceRepository;
#[cfg(test)]
pub use token_issuer::MockTokenIssuer;
pub use token_issuer::{TokenError, TokenIssuer};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::UserRepository;
