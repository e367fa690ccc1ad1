//! Payment endpoints and the Stripe webhook receiver.
//!
//! ```text
//! POST /api/v1/payments/checkout {"bookingId":"...","method":"card"}
//! GET /api/v1/payments
//! POST /api/v1/payments/webhook   (Stripe-Signature: t=...,v1=...)
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{BookingId, Error, Payment, PaymentMethod};

use super::ApiResult;
use super::auth::Authenticated;
use super::state::HttpState;
use super::validation::{FieldName, parse_id};

/// Header carrying the webhook signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Checkout body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub booking_id: String,
    pub method: PaymentMethod,
}

/// Webhook acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
    /// Payment touched by the event; absent for ignored events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,
}

/// Pay for an accepted booking. Card payments return a hosted checkout URL;
/// Apple Pay settles immediately.
#[utoipa::path(
    post,
    path = "/api/v1/payments/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Payment opened", body = Payment),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Caller is not the booking's client", body = Error),
        (status = 404, description = "Booking not found", body = Error),
        (status = 409, description = "Booking not payable or already paid", body = Error),
        (status = 503, description = "Card payments not configured", body = Error)
    ),
    tags = ["payments"],
    operation_id = "createCheckout"
)]
#[post("/payments/checkout")]
pub async fn create_checkout(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    payload: web::Json<CheckoutRequest>,
) -> ApiResult<HttpResponse> {
    let booking_id: BookingId = parse_id(&payload.booking_id, FieldName::new("bookingId"))?;
    let email = state.accounts.me(principal.user_id).await?.email;
    let payment = state
        .payments
        .checkout(principal, booking_id, payload.method, Some(email.to_string()))
        .await?;
    Ok(HttpResponse::Created().json(payment))
}

/// The caller's payments; admins see all.
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    responses(
        (status = 200, description = "Payments", body = [Payment]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["payments"],
    operation_id = "listPayments"
)]
#[get("/payments")]
pub async fn list_payments(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
) -> ApiResult<web::Json<Vec<Payment>>> {
    state.payments.list(principal).await.map(web::Json)
}

/// Stripe event receiver. The raw body is verified against the signature
/// header before it is parsed.
#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    request_body(content = String, content_type = "application/json"),
    params(("Stripe-Signature" = String, Header, description = "t=<unix>,v1=<hex hmac>")),
    responses(
        (status = 200, description = "Event processed or ignored", body = WebhookAck),
        (status = 400, description = "Missing or invalid signature", body = Error),
        (status = 404, description = "Unknown checkout session", body = Error),
        (status = 503, description = "Webhook secret not configured", body = Error)
    ),
    tags = ["payments"],
    operation_id = "stripeWebhook",
    security([])
)]
#[post("/payments/webhook")]
pub async fn stripe_webhook(
    req: HttpRequest,
    state: web::Data<HttpState>,
    body: web::Bytes,
) -> ApiResult<web::Json<WebhookAck>> {
    let signature = req
        .headers()
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            Error::invalid_field(
                "Stripe-Signature",
                "missing_signature",
                "signature header is required",
            )
        })?;
    let payment = state.payments.handle_webhook(&body, signature).await?;
    Ok(web::Json(WebhookAck {
        received: true,
        payment,
    }))
}
