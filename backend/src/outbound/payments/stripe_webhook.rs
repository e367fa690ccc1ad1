//! Stripe webhook authentication and event decoding.
//!
//! The `Stripe-Signature` header has the form `t=<unix>,v1=<hex>[,v1=<hex>]`.
//! Each `v1` value is an HMAC-SHA256 over `"{t}.{payload}"` keyed by the
//! endpoint secret.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::WebhookEvent;
use crate::domain::ports::{WebhookError, WebhookVerifier};

/// Accepted clock skew between Stripe and us, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verifies `Stripe-Signature` headers with the endpoint secret.
#[derive(Clone)]
pub struct StripeWebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl StripeWebhookVerifier {
    /// Verifier with the default tolerance. An empty secret rejects every
    /// webhook as unconfigured.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: SIGNATURE_TOLERANCE_SECS,
        }
    }
}

struct SignatureHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

fn parse_header(header: &str) -> Result<SignatureHeader<'_>, WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" if !value.is_empty() => signatures.push(value),
            _ => {}
        }
    }
    match timestamp {
        Some(timestamp) if !signatures.is_empty() => Ok(SignatureHeader {
            timestamp,
            signatures,
        }),
        _ => Err(WebhookError::malformed_signature()),
    }
}

fn expected_signature(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, WebhookError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::unconfigured())?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[derive(Debug, Deserialize)]
struct EventDto {
    #[serde(rename = "type")]
    event_type: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: EventObject,
}

#[derive(Debug, Deserialize)]
struct EventObject {
    id: Option<String>,
    #[serde(default)]
    metadata: Option<EventMetadata>,
}

#[derive(Debug, Deserialize)]
struct EventMetadata {
    payment_id: Option<String>,
}

fn decode_event(payload: &[u8]) -> Result<WebhookEvent, WebhookError> {
    let event: EventDto = serde_json::from_slice(payload)
        .map_err(|err| WebhookError::invalid_payload(err.to_string()))?;
    let EventObject { id, metadata } = event.data.object;
    let session_id =
        move || id.ok_or_else(|| WebhookError::invalid_payload("event object has no id"));
    let event = match event.event_type.as_str() {
        "checkout.session.completed" => WebhookEvent::CheckoutCompleted {
            reference: session_id()?,
        },
        "checkout.session.expired" => WebhookEvent::CheckoutFailed {
            reference: session_id()?,
        },
        "payment_intent.payment_failed" => {
            match metadata.and_then(|metadata| metadata.payment_id) {
                Some(reference) => WebhookEvent::CheckoutFailed { reference },
                None => WebhookEvent::Ignored {
                    event_type: event.event_type,
                },
            }
        }
        _ => WebhookEvent::Ignored {
            event_type: event.event_type,
        },
    };
    Ok(event)
}

impl WebhookVerifier for StripeWebhookVerifier {
    fn verify(
        &self,
        payload: &[u8],
        signature: &str,
        now: i64,
    ) -> Result<WebhookEvent, WebhookError> {
        if self.secret.is_empty() {
            return Err(WebhookError::unconfigured());
        }
        let header = parse_header(signature)?;
        if now.abs_diff(header.timestamp) > self.tolerance_secs.unsigned_abs() {
            return Err(WebhookError::stale_timestamp());
        }
        let expected = expected_signature(&self.secret, header.timestamp, payload)?;
        let matched = header
            .signatures
            .iter()
            .any(|candidate| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())));
        if !matched {
            return Err(WebhookError::signature_mismatch());
        }
        decode_event(payload)
    }
}
