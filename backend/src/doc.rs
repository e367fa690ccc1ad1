//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] generates the OpenAPI document for the REST API. It registers
//! every `/api/v1` handler plus the health checks, the shared error schema,
//! and two security schemes: the session cookie set at login and JWT bearer
//! tokens. Handlers open to anonymous callers override security with `[]`.
//!
//! The generated document is served by Swagger UI in debug builds and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::domain::assistant::AssistantReply;
use crate::domain::{
    Booking, Dashboard, Error, ErrorCode, Notification, Payment, ProviderApplication, Review,
    Service, User,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the cookie and bearer schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/login.",
            ))),
        );
        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Khidma API",
        description = "Bilingual service marketplace: listings, bookings, payments, reviews and a guard-railed assistant.",
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = []), ("BearerToken" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::accounts::current_user,
        crate::inbound::http::accounts::update_current_user,
        crate::inbound::http::services::search_services,
        crate::inbound::http::services::create_service,
        crate::inbound::http::services::get_service,
        crate::inbound::http::services::update_service,
        crate::inbound::http::services::archive_service,
        crate::inbound::http::services::service_reviews,
        crate::inbound::http::services::provider_services,
        crate::inbound::http::bookings::create_booking,
        crate::inbound::http::bookings::list_bookings,
        crate::inbound::http::bookings::get_booking,
        crate::inbound::http::bookings::accept_booking,
        crate::inbound::http::bookings::start_booking,
        crate::inbound::http::bookings::complete_booking,
        crate::inbound::http::bookings::cancel_booking,
        crate::inbound::http::payments::create_checkout,
        crate::inbound::http::payments::list_payments,
        crate::inbound::http::payments::stripe_webhook,
        crate::inbound::http::reviews::create_review,
        crate::inbound::http::notifications::list_notifications,
        crate::inbound::http::notifications::mark_all_read,
        crate::inbound::http::notifications::mark_read,
        crate::inbound::http::applications::apply,
        crate::inbound::http::applications::my_application,
        crate::inbound::http::admin::list_applications,
        crate::inbound::http::admin::approve_application,
        crate::inbound::http::admin::reject_application,
        crate::inbound::http::admin::pending_services,
        crate::inbound::http::admin::approve_service,
        crate::inbound::http::admin::reject_service,
        crate::inbound::http::admin::list_users,
        crate::inbound::http::admin::dashboard,
        crate::inbound::http::assistant::chat,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        Service,
        Booking,
        Payment,
        Review,
        Notification,
        ProviderApplication,
        Dashboard,
        AssistantReply,
    )),
    tags(
        (name = "accounts", description = "Registration, login and profile"),
        (name = "services", description = "Service listings and search"),
        (name = "bookings", description = "Booking lifecycle"),
        (name = "payments", description = "Checkout and payment webhooks"),
        (name = "reviews", description = "Reviews of completed bookings"),
        (name = "notifications", description = "In-app notifications"),
        (name = "provider-applications", description = "Becoming a provider"),
        (name = "admin", description = "Moderation and dashboard"),
        (name = "assistant", description = "Marketplace assistant"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
