//! Port abstraction for booking persistence.

use async_trait::async_trait;

use crate::domain::{Booking, BookingId, BookingParty, BookingStatus, UserId};

use super::RepositoryError;

/// Booking storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a new booking.
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError>;

    /// Replace an existing booking whose stored status is still `expected`.
    ///
    /// A booking that moved on in the meantime yields a conflict.
    async fn update(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<(), RepositoryError>;

    /// Fetch a booking.
    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, RepositoryError>;

    /// Bookings where `user` is on `party`'s side, newest scheduled first.
    async fn list_for(
        &self,
        user: UserId,
        party: BookingParty,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, RepositoryError>;

    /// Number of bookings per status.
    async fn count_by_status(&self) -> Result<Vec<(BookingStatus, u64)>, RepositoryError>;
}
