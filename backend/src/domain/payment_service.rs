//! Checkout and settlement of booking payments.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use super::ports::{
    BookingRepository, CheckoutRequest, PaymentGateway, PaymentGatewayError, PaymentRepository,
    RepositoryError, WebhookError, WebhookVerifier,
};
use super::service_support::map_repository_error;
use super::{
    BookingId, BookingStatus, CatalogueService, Error, Locale, NotificationKind,
    NotificationService, Payment, PaymentId, PaymentMethod, PaymentStatus, Principal, UserId,
};

/// Gateways keyed by payment method.
#[derive(Clone)]
pub struct PaymentGateways {
    /// Hosted card checkout.
    pub card: Arc<dyn PaymentGateway>,
    /// Wallet payments.
    pub apple_pay: Arc<dyn PaymentGateway>,
}

impl PaymentGateways {
    fn for_method(&self, method: PaymentMethod) -> &Arc<dyn PaymentGateway> {
        match method {
            PaymentMethod::Card => &self.card,
            PaymentMethod::ApplePay => &self.apple_pay,
        }
    }
}

/// Payment use-cases.
#[derive(Clone)]
pub struct PaymentService {
    payments: Arc<dyn PaymentRepository>,
    bookings: Arc<dyn BookingRepository>,
    catalogue: CatalogueService,
    gateways: PaymentGateways,
    webhooks: Arc<dyn WebhookVerifier>,
    notifications: NotificationService,
    clock: Arc<dyn Clock>,
}

fn map_gateway_error(error: PaymentGatewayError) -> Error {
    match error {
        PaymentGatewayError::Unconfigured | PaymentGatewayError::Transport { .. } => {
            Error::service_unavailable(error.to_string())
        }
        PaymentGatewayError::Rejected { message } => Error::invalid_request(message),
        PaymentGatewayError::Decode { .. } => Error::internal(error.to_string()),
    }
}

fn map_webhook_error(error: WebhookError) -> Error {
    match error {
        WebhookError::Unconfigured => Error::service_unavailable(error.to_string()),
        other => Error::invalid_request(other.to_string()),
    }
}

/// Payment writes only conflict when a concurrent checkout already settled
/// the booking.
fn map_payment_write_error(error: RepositoryError) -> Error {
    match error {
        RepositoryError::Conflict { .. } => Error::conflict("booking is already paid"),
        other => map_repository_error(other),
    }
}

impl PaymentService {
    /// Wire the service to its collaborators.
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        bookings: Arc<dyn BookingRepository>,
        catalogue: CatalogueService,
        gateways: PaymentGateways,
        webhooks: Arc<dyn WebhookVerifier>,
        notifications: NotificationService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            payments,
            bookings,
            catalogue,
            gateways,
            webhooks,
            notifications,
            clock,
        }
    }

    /// Open a checkout for an accepted booking.
    pub async fn checkout(
        &self,
        actor: Principal,
        booking_id: BookingId,
        method: PaymentMethod,
        customer_email: Option<String>,
    ) -> Result<Payment, Error> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await
            .map_err(map_repository_error)?
            .filter(|b| b.is_participant(actor.user_id))
            .ok_or_else(|| Error::not_found(format!("booking {booking_id} not found")))?;
        if booking.client_id != actor.user_id {
            return Err(Error::forbidden("only the client may pay for this booking"));
        }
        if !matches!(
            booking.status,
            BookingStatus::Accepted | BookingStatus::InProgress | BookingStatus::Completed
        ) {
            return Err(Error::conflict(format!(
                "bookings that are {} cannot be paid",
                booking.status
            )));
        }
        let existing = self
            .payments
            .list_for_booking(booking.id)
            .await
            .map_err(map_repository_error)?;
        if existing
            .iter()
            .any(|p| p.status == PaymentStatus::Succeeded)
        {
            return Err(Error::conflict("booking is already paid"));
        }

        let description = self
            .catalogue
            .get(Some(actor), booking.service_id)
            .await
            .map(|service| service.title.get(Locale::En).to_owned())
            .unwrap_or_else(|_| format!("Booking {}", booking.id));
        let request = CheckoutRequest {
            payment_id: PaymentId::random(),
            booking_id: booking.id,
            amount: booking.price.clone(),
            description,
            customer_email,
        };
        let session = self
            .gateways
            .for_method(method)
            .open_checkout(&request)
            .await
            .map_err(map_gateway_error)?;
        let now = self.clock.utc();
        let payment = Payment {
            id: request.payment_id,
            booking_id: booking.id,
            payer_id: actor.user_id,
            amount: request.amount,
            method,
            status: session.status,
            provider_reference: Some(session.reference),
            checkout_url: session.checkout_url,
            created_at: now,
            updated_at: now,
        };
        self.payments
            .insert(&payment)
            .await
            .map_err(map_payment_write_error)?;
        info!(
            payment_id = %payment.id,
            booking_id = %booking.id,
            method = method.as_str(),
            status = payment.status.as_str(),
            "checkout opened"
        );
        if payment.status == PaymentStatus::Succeeded {
            self.announce(&payment, Some(booking.provider_id), NotificationKind::PaymentSucceeded)
                .await;
        }
        Ok(payment)
    }

    /// Verify and apply a provider webhook. Returns the updated payment, or
    /// `None` for ignored event types.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<Option<Payment>, Error> {
        let event = self
            .webhooks
            .verify(payload, signature, self.clock.utc().timestamp())
            .map_err(map_webhook_error)?;
        let Some((reference, status)) = event.target_status() else {
            info!(?event, "webhook event ignored");
            return Ok(None);
        };
        let mut payment = self
            .find_for_reference(reference)
            .await?
            .ok_or_else(|| Error::not_found(format!("no payment for session {reference}")))?;
        if payment.status == status {
            return Ok(Some(payment));
        }
        if payment.status != PaymentStatus::Pending {
            warn!(
                payment_id = %payment.id,
                current = payment.status.as_str(),
                requested = status.as_str(),
                "webhook ignored for settled payment"
            );
            return Ok(Some(payment));
        }
        payment.status = status;
        payment.updated_at = self.clock.utc();
        self.payments
            .update(&payment)
            .await
            .map_err(map_payment_write_error)?;
        info!(payment_id = %payment.id, status = status.as_str(), "payment settled by webhook");
        let provider = self
            .bookings
            .find_by_id(payment.booking_id)
            .await
            .map_err(map_repository_error)?
            .map(|b| b.provider_id);
        if status == PaymentStatus::Succeeded {
            self.announce(&payment, provider, NotificationKind::PaymentSucceeded)
                .await;
        } else {
            self.announce(&payment, None, NotificationKind::PaymentFailed)
                .await;
        }
        Ok(Some(payment))
    }

    /// Payment-intent events carry our payment id rather than the session
    /// id, so fall back to an id lookup.
    async fn find_for_reference(&self, reference: &str) -> Result<Option<Payment>, Error> {
        let by_reference = self
            .payments
            .find_by_reference(reference)
            .await
            .map_err(map_repository_error)?;
        match (by_reference, reference.parse::<PaymentId>()) {
            (Some(payment), _) => Ok(Some(payment)),
            (None, Ok(id)) => self
                .payments
                .find_by_id(id)
                .await
                .map_err(map_repository_error),
            (None, Err(_)) => Ok(None),
        }
    }

    /// The caller's payments; admins see every payment.
    pub async fn list(&self, actor: Principal) -> Result<Vec<Payment>, Error> {
        let payer = (!actor.is_admin()).then_some(actor.user_id);
        self.payments.list(payer).await.map_err(map_repository_error)
    }

    /// Gross succeeded volume per currency.
    pub(crate) async fn succeeded_volume(&self) -> Result<Vec<(String, i64)>, Error> {
        self.payments
            .succeeded_volume()
            .await
            .map_err(map_repository_error)
    }

    /// Notify the payer and, when given, the provider.
    async fn announce(&self, payment: &Payment, provider: Option<UserId>, kind: NotificationKind) {
        let reference = Some(*payment.id.as_uuid());
        self.notifications
            .notify(payment.payer_id, kind, reference, None)
            .await;
        if let Some(provider) = provider {
            self.notifications
                .notify(provider, kind, reference, None)
                .await;
        }
    }
}

#[cfg(test)]
#[path = "payment_service_tests.rs"]
mod tests;
