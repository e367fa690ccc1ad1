//! Stripe Checkout Session adapter.
//!
//! Transport only: form encoding, bearer auth, timeout, status mapping and
//! decoding of the session id and hosted URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::domain::ports::{CheckoutRequest, PaymentGateway, PaymentGatewayError};
use crate::domain::{CheckoutSession, PaymentStatus};

/// Production Stripe API root.
pub const STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Credentials and redirect targets for hosted checkout.
#[derive(Debug, Clone)]
pub struct StripeCheckoutSettings {
    /// Secret API key (`sk_...`).
    pub secret_key: String,
    /// API root, overridable for stripe-mock.
    pub api_base: String,
    /// Where Stripe sends the payer after paying.
    pub success_url: String,
    /// Where Stripe sends the payer after abandoning checkout.
    pub cancel_url: String,
    /// Single request timeout.
    pub timeout: Duration,
}

/// Opens Stripe Checkout Sessions for card payments.
pub struct StripeCheckoutGateway {
    client: Client,
    settings: StripeCheckoutSettings,
}

impl StripeCheckoutGateway {
    /// Build the gateway with a client that enforces `settings.timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(settings: StripeCheckoutSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/checkout/sessions",
            self.settings.api_base.trim_end_matches('/')
        )
    }
}

#[derive(Debug, Deserialize)]
struct SessionDto {
    id: String,
    url: Option<String>,
}

/// Form fields for `POST /v1/checkout/sessions`.
fn checkout_form(
    request: &CheckoutRequest,
    settings: &StripeCheckoutSettings,
) -> Vec<(&'static str, String)> {
    let payment_id = request.payment_id.to_string();
    let mut form = vec![
        ("mode", "payment".to_owned()),
        ("success_url", settings.success_url.clone()),
        ("cancel_url", settings.cancel_url.clone()),
        ("client_reference_id", payment_id.clone()),
        ("metadata[payment_id]", payment_id.clone()),
        ("metadata[booking_id]", request.booking_id.to_string()),
        ("payment_intent_data[metadata][payment_id]", payment_id),
        (
            "line_items[0][price_data][currency]",
            request.amount.currency().to_ascii_lowercase(),
        ),
        (
            "line_items[0][price_data][unit_amount]",
            request.amount.amount_minor().to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]",
            request.description.clone(),
        ),
        ("line_items[0][quantity]", "1".to_owned()),
    ];
    if let Some(email) = &request.customer_email {
        form.push(("customer_email", email.clone()));
    }
    form
}

#[async_trait]
impl PaymentGateway for StripeCheckoutGateway {
    async fn open_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.settings.secret_key)
            .header("Idempotency-Key", request.payment_id.to_string())
            .form(&checkout_form(request, &self.settings))
            .send()
            .await
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_session(body.as_ref())
    }
}

fn parse_session(body: &[u8]) -> Result<CheckoutSession, PaymentGatewayError> {
    let session: SessionDto = serde_json::from_slice(body)
        .map_err(|err| PaymentGatewayError::decode(format!("invalid session payload: {err}")))?;
    if session.url.is_none() {
        return Err(PaymentGatewayError::decode("session has no checkout url"));
    }
    Ok(CheckoutSession {
        reference: session.id,
        checkout_url: session.url,
        status: PaymentStatus::Pending,
    })
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDto,
}

#[derive(Debug, Deserialize)]
struct ErrorDto {
    message: Option<String>,
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PaymentGatewayError {
    let detail = serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| format!("status {}", status.as_u16()));
    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        PaymentGatewayError::rejected(detail)
    } else {
        PaymentGatewayError::transport(detail)
    }
}

/// Card gateway used when Stripe is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn open_checkout(
        &self,
        _request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        Err(PaymentGatewayError::unconfigured())
    }
}
