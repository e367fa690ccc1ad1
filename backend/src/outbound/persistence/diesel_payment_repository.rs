//! PostgreSQL-backed `PaymentRepository`.

use async_trait::async_trait;
use diesel::data_types::PgNumeric;
use diesel::dsl::sum;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PaymentRepository, RepositoryError};
use crate::domain::{BookingId, Payment, PaymentId, PaymentStatus, UserId};

use super::error_mapping::map_diesel_error;
use super::models::{PaymentRow, convert_rows};
use super::pool::DbPool;
use super::schema::payments;

/// Diesel implementation of [`PaymentRepository`].
#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for DieselPaymentRepository {
    async fn insert(&self, payment: &Payment) -> Result<(), RepositoryError> {
        let mut conn = self.pool.connection().await?;
        diesel::insert_into(payments::table)
            .values(PaymentRow::from(payment))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, payment: &Payment) -> Result<(), RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let updated = diesel::update(payments::table.filter(payments::id.eq(payment.id.as_uuid())))
            .set(PaymentRow::from(payment))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(RepositoryError::missing(format!("payment {}", payment.id)));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let row = payments::table
            .filter(payments::id.eq(id.as_uuid()))
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Payment::try_from).transpose()
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let row = payments::table
            .filter(payments::provider_reference.eq(reference))
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Payment::try_from).transpose()
    }

    async fn list_for_booking(&self, booking: BookingId) -> Result<Vec<Payment>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let rows = payments::table
            .filter(payments::booking_id.eq(booking.as_uuid()))
            .select(PaymentRow::as_select())
            .order_by(payments::created_at.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn list(&self, payer: Option<UserId>) -> Result<Vec<Payment>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let mut query = payments::table
            .select(PaymentRow::as_select())
            .order_by(payments::created_at.desc())
            .into_boxed();
        if let Some(payer) = payer {
            query = query.filter(payments::payer_id.eq(*payer.as_uuid()));
        }
        let rows = query.load(&mut conn).await.map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn succeeded_volume(&self) -> Result<Vec<(String, i64)>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let rows: Vec<(String, Option<PgNumeric>)> = payments::table
            .filter(payments::status.eq(PaymentStatus::Succeeded.as_str()))
            .group_by(payments::currency)
            .select((payments::currency, sum(payments::amount_minor)))
            .order_by(payments::currency)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|(currency, total)| {
                (currency, total.and_then(numeric_to_i64).unwrap_or_default())
            })
            .collect())
    }
}

/// `SUM(BIGINT)` is `NUMERIC` in PostgreSQL; totals fit in `i64` in practice.
fn numeric_to_i64(value: PgNumeric) -> Option<i64> {
    let (negative, weight, digits) = match value {
        PgNumeric::Positive { weight, digits, .. } => (false, weight, digits),
        PgNumeric::Negative { weight, digits, .. } => (true, weight, digits),
        PgNumeric::NaN => return None,
    };
    let mut total: i64 = 0;
    for position in 0..=i32::from(weight) {
        let digit = usize::try_from(position)
            .ok()
            .and_then(|i| digits.get(i))
            .copied()
            .unwrap_or(0);
        total = total.checked_mul(10_000)?.checked_add(i64::from(digit))?;
    }
    Some(if negative { -total } else { total })
}

#[cfg(test)]
mod tests {
    use super::numeric_to_i64;
    use diesel::data_types::PgNumeric;
    use rstest::rstest;

    #[rstest]
    #[case(PgNumeric::Positive { weight: 0, scale: 0, digits: vec![42] }, Some(42))]
    #[case(PgNumeric::Positive { weight: 1, scale: 0, digits: vec![1, 2500] }, Some(12_500))]
    #[case(PgNumeric::Positive { weight: 1, scale: 0, digits: vec![3] }, Some(30_000))]
    #[case(PgNumeric::Negative { weight: 0, scale: 0, digits: vec![7] }, Some(-7))]
    #[case(PgNumeric::NaN, None)]
    fn sums_decode_from_base_10000(#[case] value: PgNumeric, #[case] expected: Option<i64>) {
        assert_eq!(numeric_to_i64(value), expected);
    }
}
