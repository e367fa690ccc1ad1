//! Port abstractions for payment providers and their webhooks.

use async_trait::async_trait;

use crate::domain::{BookingId, CheckoutSession, Money, PaymentId, WebhookEvent};

use super::define_port_error;

define_port_error! {
    /// Payment provider failures.
    pub enum PaymentGatewayError {
        /// Gateway not configured.
        Unconfigured => "payment gateway is not configured",
        /// Provider unreachable or timed out.
        Transport { message: String } => transient "payment gateway request failed: {message}",
        /// Provider rejected the request.
        Rejected { message: String } => "payment gateway rejected the request: {message}",
        /// Provider answered with an unexpected payload.
        Decode { message: String } => "payment gateway response invalid: {message}",
    }
}

define_port_error! {
    /// Webhook verification failures.
    pub enum WebhookError {
        /// Webhook secret missing.
        Unconfigured => "webhook secret is not configured",
        /// Signature header absent or malformed.
        MalformedSignature => "signature header is malformed",
        /// Timestamp outside the tolerance window.
        StaleTimestamp => "signature timestamp is outside the tolerance window",
        /// No signature matched.
        SignatureMismatch => "signature does not match payload",
        /// Payload is not a valid event.
        InvalidPayload { message: String } => "webhook payload invalid: {message}",
    }
}

/// What a checkout is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub payment_id: PaymentId,
    pub booking_id: BookingId,
    pub amount: Money,
    /// Line item label shown by hosted checkout pages.
    pub description: String,
    pub customer_email: Option<String>,
}

/// Opens checkouts with a payment provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Start a checkout for `request`.
    async fn open_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError>;
}

/// Authenticates and decodes provider webhooks.
#[cfg_attr(test, mockall::automock)]
pub trait WebhookVerifier: Send + Sync {
    /// Verify `signature` over `payload` at unix time `now` and decode the event.
    fn verify(
        &self,
        payload: &[u8],
        signature: &str,
        now: i64,
    ) -> Result<WebhookEvent, WebhookError>;
}
