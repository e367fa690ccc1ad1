//! Booking lifecycle use-cases.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::info;

use super::ports::{BookingRepository, PaymentRepository};
use super::service_support::{invalid_value, map_repository_error};
use super::{
    Booking, BookingAction, BookingId, BookingParty, BookingRequest, BookingStatus,
    CancelReason, Cancellation, CatalogueService, Error, NotificationKind, NotificationService,
    PaymentStatus, Principal, ServiceId,
};

/// Booking use-cases.
#[derive(Clone)]
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    catalogue: CatalogueService,
    notifications: NotificationService,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    /// Wire the service to its collaborators.
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentRepository>,
        catalogue: CatalogueService,
        notifications: NotificationService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings,
            payments,
            catalogue,
            notifications,
            clock,
        }
    }

    /// Request a booking of an approved listing.
    pub async fn create(
        &self,
        actor: Principal,
        service_id: ServiceId,
        scheduled_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<Booking, Error> {
        let now = self.clock.utc();
        let request = BookingRequest::new(service_id, scheduled_at, notes, now)
            .map_err(|err| invalid_value(err.field(), err))?;
        let service = self.catalogue.get_approved(request.service_id).await?;
        if service.provider_id == actor.user_id {
            return Err(Error::forbidden("providers cannot book their own services"));
        }
        let booking = Booking {
            id: BookingId::random(),
            service_id: service.id,
            client_id: actor.user_id,
            provider_id: service.provider_id,
            scheduled_at: request.scheduled_at,
            notes: request.notes,
            price: service.price,
            status: BookingStatus::Pending,
            cancellation: None,
            created_at: now,
            updated_at: now,
        };
        self.bookings
            .insert(&booking)
            .await
            .map_err(map_repository_error)?;
        info!(booking_id = %booking.id, service_id = %service.id, "booking requested");
        self.notifications
            .notify(
                booking.provider_id,
                NotificationKind::BookingRequested,
                Some(*booking.id.as_uuid()),
                None,
            )
            .await;
        Ok(booking)
    }

    /// Provider-side transition: accept, start or complete.
    pub async fn advance(
        &self,
        actor: Principal,
        id: BookingId,
        action: BookingAction,
    ) -> Result<Booking, Error> {
        let mut booking = self.visible(actor, id).await?;
        if booking.provider_id != actor.user_id {
            return Err(Error::forbidden(format!(
                "only the provider may {} this booking",
                action.as_str()
            )));
        }
        let kind = match action {
            BookingAction::Accept => NotificationKind::BookingAccepted,
            BookingAction::Start => NotificationKind::BookingStarted,
            BookingAction::Complete => NotificationKind::BookingCompleted,
            BookingAction::Cancel => {
                return Err(Error::invalid_request("use the cancel operation"));
            }
        };
        let prior = booking.status;
        booking
            .transition(action, self.clock.utc())
            .map_err(|err| Error::conflict(err.to_string()))?;
        self.bookings
            .update(&booking, prior)
            .await
            .map_err(map_repository_error)?;
        info!(booking_id = %booking.id, status = %booking.status, "booking advanced");
        self.notifications
            .notify(booking.client_id, kind, Some(*booking.id.as_uuid()), None)
            .await;
        Ok(booking)
    }

    /// Cancel a pending or accepted booking. A succeeded payment is marked
    /// refunded.
    pub async fn cancel(
        &self,
        actor: Principal,
        id: BookingId,
        reason: CancelReason,
    ) -> Result<Booking, Error> {
        let mut booking = self.visible(actor, id).await?;
        if !booking.is_participant(actor.user_id) {
            return Err(Error::forbidden("only participants may cancel this booking"));
        }
        let now = self.clock.utc();
        let prior = booking.status;
        booking
            .transition(BookingAction::Cancel, now)
            .map_err(|err| Error::conflict(err.to_string()))?;
        booking.cancellation = Some(Cancellation {
            by: actor.user_id,
            reason: reason.into_inner(),
        });
        self.bookings
            .update(&booking, prior)
            .await
            .map_err(map_repository_error)?;
        self.refund_succeeded_payments(booking.id, now).await?;
        info!(booking_id = %booking.id, cancelled_by = %actor.user_id, "booking cancelled");
        let note = booking.cancellation.as_ref().map(|c| c.reason.as_str());
        self.notifications
            .notify(
                booking.counterpart_of(actor.user_id),
                NotificationKind::BookingCancelled,
                Some(*booking.id.as_uuid()),
                note,
            )
            .await;
        Ok(booking)
    }

    /// A booking visible to participants and admins.
    pub async fn get(&self, actor: Principal, id: BookingId) -> Result<Booking, Error> {
        self.visible(actor, id).await
    }

    /// The caller's bookings from one side.
    pub async fn list(
        &self,
        actor: Principal,
        party: BookingParty,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, Error> {
        self.bookings
            .list_for(actor.user_id, party, status)
            .await
            .map_err(map_repository_error)
    }

    /// Number of bookings per status.
    pub(crate) async fn count_by_status(&self) -> Result<Vec<(BookingStatus, u64)>, Error> {
        self.bookings
            .count_by_status()
            .await
            .map_err(map_repository_error)
    }

    async fn visible(&self, actor: Principal, id: BookingId) -> Result<Booking, Error> {
        let booking = self
            .bookings
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .filter(|b| b.is_participant(actor.user_id) || actor.is_admin())
            .ok_or_else(|| Error::not_found(format!("booking {id} not found")))?;
        Ok(booking)
    }

    async fn refund_succeeded_payments(
        &self,
        booking: BookingId,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let payments = self
            .payments
            .list_for_booking(booking)
            .await
            .map_err(map_repository_error)?;
        for mut payment in payments
            .into_iter()
            .filter(|p| p.status == PaymentStatus::Succeeded)
        {
            payment.status = PaymentStatus::Refunded;
            payment.updated_at = now;
            self.payments
                .update(&payment)
                .await
                .map_err(map_repository_error)?;
            info!(payment_id = %payment.id, "payment marked refunded");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "booking_service_tests.rs"]
mod tests;
