//! Domain primitives, aggregates, services and ports.
//!
//! Purpose: define the strongly typed marketplace model used by the HTTP,
//! WebSocket and persistence adapters. Validating constructors enforce field
//! invariants; services enforce ownership, roles and lifecycle rules and talk
//! to the outside world only through [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Entities: User, Service, Booking, Payment, Review, Notification,
//!   ProviderApplication.
//! - Services: one per use-case family, see the `*_service` modules.

pub mod assistant;
mod auth;
mod booking;
mod catalogue;
pub mod error;
mod ids;
mod locale;
mod notification;
mod payment;
pub mod ports;
mod provider_application;
mod review;
mod trace_id;
mod user;

mod account_service;
mod admin_service;
mod application_service;
mod assistant_service;
mod booking_service;
mod catalogue_service;
mod notification_service;
mod payment_service;
mod review_service;
mod service_support;

pub(crate) use self::service_support::invalid_value;

pub use self::account_service::{AccountService, LoginOutcome};
pub use self::admin_service::{AdminService, Dashboard, StatusCount};
pub use self::application_service::ApplicationService;
pub use self::assistant_service::{AssistantRequest, AssistantService};
pub use self::auth::{
    CredentialsValidationError, IssuedToken, LoginCredentials, PASSWORD_MAX, PASSWORD_MIN,
    Principal, Registration,
};
pub use self::booking::{
    Booking, BookingAction, BookingParty, BookingRequest, BookingStatus, BookingValidationError,
    CANCEL_REASON_MIN, CancelReason, Cancellation, NOTES_MAX, TransitionError,
};
pub use self::booking_service::BookingService;
pub use self::catalogue::{
    Category, CatalogueValidationError, DURATION_MAX, DURATION_MIN, Money, Service,
    ServiceCursorKey, ServiceDraft, ServiceDraftInput, ServiceFilter, ServiceStatus,
    ServiceUpdate,
};
pub use self::catalogue_service::CatalogueService;
pub use self::error::{Error, ErrorCode};
pub use self::ids::{
    ApplicationId, BookingId, IdParseError, NotificationId, PaymentId, ReviewId, ServiceId, UserId,
};
pub use self::locale::{Locale, LocalizedText, LocalizedTextError};
pub use self::notification::{Notification, NotificationKind};
pub use self::notification_service::NotificationService;
pub use self::payment::{
    CheckoutSession, Payment, PaymentMethod, PaymentStatus, WebhookEvent,
};
pub use self::payment_service::{PaymentGateways, PaymentService};
pub use self::provider_application::{
    ApplicationDraft, ApplicationStatus, ApplicationValidationError, Decision,
    ProviderApplication,
};
pub use self::review::{
    COMMENT_MAX, Rating, RatingSummary, Review, ReviewDraft, ReviewValidationError,
};
pub use self::review_service::{ReviewService, ServiceReviews};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    DISPLAY_NAME_MAX, DISPLAY_NAME_MIN, DisplayName, Email, PhoneNumber, ProfileUpdate, Role,
    StoredUser, User, UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use khidma::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
