//! PostgreSQL-backed `BookingRepository`.

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{BookingRepository, RepositoryError};
use crate::domain::{Booking, BookingId, BookingParty, BookingStatus, UserId};

use super::error_mapping::map_diesel_error;
use super::models::{BookingRow, convert_rows, tally_rows};
use super::pool::DbPool;
use super::schema::bookings;

/// Diesel implementation of [`BookingRepository`].
#[derive(Clone)]
pub struct DieselBookingRepository {
    pool: DbPool,
}

impl DieselBookingRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for DieselBookingRepository {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError> {
        let mut conn = self.pool.connection().await?;
        diesel::insert_into(bookings::table)
            .values(BookingRow::from(booking))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let id = booking.id.as_uuid();
        let updated = diesel::update(
            bookings::table
                .filter(bookings::id.eq(id))
                .filter(bookings::status.eq(expected.as_str())),
        )
        .set(BookingRow::from(booking))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        if updated > 0 {
            return Ok(());
        }
        let exists: i64 = bookings::table
            .filter(bookings::id.eq(id))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Err(if exists == 0 {
            RepositoryError::missing(format!("booking {}", booking.id))
        } else {
            RepositoryError::conflict(format!(
                "booking {} is no longer {}",
                booking.id,
                expected.as_str()
            ))
        })
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let row = bookings::table
            .filter(bookings::id.eq(id.as_uuid()))
            .select(BookingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Booking::try_from).transpose()
    }

    async fn list_for(
        &self,
        user: UserId,
        party: BookingParty,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let user = *user.as_uuid();
        let mut query = bookings::table
            .select(BookingRow::as_select())
            .order_by(bookings::scheduled_at.desc())
            .into_boxed();
        query = match party {
            BookingParty::Client => query.filter(bookings::client_id.eq(user)),
            BookingParty::Provider => query.filter(bookings::provider_id.eq(user)),
        };
        if let Some(status) = status {
            query = query.filter(bookings::status.eq(status.as_str()));
        }
        let rows = query.load(&mut conn).await.map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn count_by_status(&self) -> Result<Vec<(BookingStatus, u64)>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let rows: Vec<(String, i64)> = bookings::table
            .group_by(bookings::status)
            .select((bookings::status, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        tally_rows(rows)
    }
}
