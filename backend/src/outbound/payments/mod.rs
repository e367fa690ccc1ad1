//! Payment provider adapters.
//!
//! Stripe Checkout handles card payments; Apple Pay is simulated and settles
//! immediately. Webhooks are authenticated with Stripe's signing scheme.

mod apple_pay;
mod stripe_checkout;
mod stripe_webhook;

pub use apple_pay::MockApplePayGateway;
pub use stripe_checkout::{STRIPE_API_BASE, StripeCheckoutGateway, StripeCheckoutSettings};
pub use stripe_webhook::{SIGNATURE_TOLERANCE_SECS, StripeWebhookVerifier};

/// Gateway used when no Stripe key is configured.
pub use stripe_checkout::UnconfiguredGateway;
