//! Port abstraction for review persistence.

use async_trait::async_trait;

use crate::domain::{BookingId, Review, ServiceId};

use super::RepositoryError;

/// Review storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Insert a review. A second review for the same booking yields
    /// [`RepositoryError::Conflict`].
    async fn insert(&self, review: &Review) -> Result<(), RepositoryError>;

    /// Review attached to a booking, if any.
    async fn find_by_booking(&self, booking: BookingId) -> Result<Option<Review>, RepositoryError>;

    /// Reviews of a listing, newest first.
    async fn list_for_service(&self, service: ServiceId) -> Result<Vec<Review>, RepositoryError>;
}
