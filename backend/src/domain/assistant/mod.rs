//! Chat assistant building blocks: guardrails, intent parsing, canned replies
//! and the response shape shared by the service and HTTP layers.

mod guardrails;
mod intent;
pub mod templates;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use self::guardrails::{GuardrailViolation, Guardrails, MESSAGE_MAX};
pub use self::intent::{Intent, IntentName, IntentParser, category_of};
use super::{Booking, Locale, Money, Service, ServiceId};

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    /// Refused by the guardrails.
    Guardrail,
    /// Produced by a marketplace action or template.
    Action,
    /// Generated by the language model.
    Model,
    /// Fallback template after a missing or failed model.
    Fallback,
}

/// Compact listing shown in chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCard {
    pub id: ServiceId,
    pub title: String,
    pub category: String,
    pub price: Money,
    pub duration_minutes: i32,
}

impl ServiceCard {
    /// Render `service` in `locale`.
    pub fn of(service: &Service, locale: Locale) -> Self {
        Self {
            id: service.id,
            title: service.title.get(locale).to_owned(),
            category: service.category.as_ref().to_owned(),
            price: service.price.clone(),
            duration_minutes: service.duration_minutes,
        }
    }
}

/// Structured payload accompanying a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantAction {
    /// Search results.
    Services { services: Vec<ServiceCard> },
    /// Suggested booking the client confirms through the bookings API.
    BookingProposal {
        service: ServiceCard,
        #[serde(rename = "scheduledAt", skip_serializing_if = "Option::is_none")]
        scheduled_at: Option<DateTime<Utc>>,
        endpoint: String,
    },
    /// The caller's bookings.
    Bookings { bookings: Vec<Booking> },
    /// Pointer to the endpoint that completes the request.
    Link { endpoint: String },
}

/// Assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    pub reply: String,
    pub locale: Locale,
    pub intent: IntentName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<AssistantAction>,
    pub source: ReplySource,
}
