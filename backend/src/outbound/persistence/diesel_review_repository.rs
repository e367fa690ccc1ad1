//! PostgreSQL-backed `ReviewRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RepositoryError, ReviewRepository};
use crate::domain::{BookingId, Review, ServiceId};

use super::error_mapping::map_diesel_error;
use super::models::{ReviewRow, convert_rows};
use super::pool::DbPool;
use super::schema::reviews;

/// Diesel implementation of [`ReviewRepository`]. The unique index on
/// `booking_id` turns a second review into a conflict.
#[derive(Clone)]
pub struct DieselReviewRepository {
    pool: DbPool,
}

impl DieselReviewRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for DieselReviewRepository {
    async fn insert(&self, review: &Review) -> Result<(), RepositoryError> {
        let mut conn = self.pool.connection().await?;
        diesel::insert_into(reviews::table)
            .values(ReviewRow::from(review))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_booking(&self, booking: BookingId) -> Result<Option<Review>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let row = reviews::table
            .filter(reviews::booking_id.eq(booking.as_uuid()))
            .select(ReviewRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Review::try_from).transpose()
    }

    async fn list_for_service(&self, service: ServiceId) -> Result<Vec<Review>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let rows = reviews::table
            .filter(reviews::service_id.eq(service.as_uuid()))
            .select(ReviewRow::as_select())
            .order_by(reviews::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows)
    }
}
