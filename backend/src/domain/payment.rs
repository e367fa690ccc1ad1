//! Payments made against bookings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BookingId, Money, PaymentId, UserId};

/// How the client pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Stripe hosted checkout.
    Card,
    /// Simulated wallet payment that settles immediately.
    ApplePay,
}

impl PaymentMethod {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::ApplePay => "apple_pay",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "apple_pay" => Ok(Self::ApplePay),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Settlement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Every status.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Succeeded, Self::Failed, Self::Refunded];

    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown payment status: {s}"))
    }
}

/// Payment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub booking_id: BookingId,
    pub payer_id: UserId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Gateway reference (Stripe checkout session id or wallet token).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_reference: Option<String>,
    /// Hosted checkout page for pending card payments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome reported by a payment gateway when a checkout is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Gateway reference to store on the payment.
    pub reference: String,
    /// Redirect target for hosted flows.
    pub checkout_url: Option<String>,
    /// Status the payment starts in.
    pub status: PaymentStatus,
}

/// Webhook event after signature verification, reduced to what the
/// marketplace acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Checkout paid.
    CheckoutCompleted { reference: String },
    /// Checkout expired or payment declined.
    CheckoutFailed { reference: String },
    /// Any other event type; acknowledged and ignored.
    Ignored { event_type: String },
}

impl WebhookEvent {
    /// Status the referenced payment should move to, if any.
    pub fn target_status(&self) -> Option<(&str, PaymentStatus)> {
        match self {
            Self::CheckoutCompleted { reference } => Some((reference, PaymentStatus::Succeeded)),
            Self::CheckoutFailed { reference } => Some((reference, PaymentStatus::Failed)),
            Self::Ignored { .. } => None,
        }
    }
}
