//! Port abstraction for payment persistence.

use async_trait::async_trait;

use crate::domain::{BookingId, Payment, PaymentId, UserId};

use super::RepositoryError;

/// Payment storage.
///
/// A booking holds at most one succeeded payment. Writes that would store a
/// second one fail with a conflict.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a new payment.
    async fn insert(&self, payment: &Payment) -> Result<(), RepositoryError>;

    /// Replace an existing payment.
    async fn update(&self, payment: &Payment) -> Result<(), RepositoryError>;

    /// Fetch a payment.
    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError>;

    /// Fetch the payment carrying a gateway reference.
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, RepositoryError>;

    /// Payments for one booking, newest first.
    async fn list_for_booking(&self, booking: BookingId) -> Result<Vec<Payment>, RepositoryError>;

    /// Payments made by `payer`, or every payment when `None`, newest first.
    async fn list(&self, payer: Option<UserId>) -> Result<Vec<Payment>, RepositoryError>;

    /// Sum of succeeded payments in minor units, per currency.
    async fn succeeded_volume(&self) -> Result<Vec<(String, i64)>, RepositoryError>;
}
