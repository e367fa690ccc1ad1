//! PostgreSQL-backed `ServiceRepository`.
//!
//! Listing search is keyset-paginated on `(created_at DESC, id DESC)`, which
//! matches the `services_listing_idx` index.

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sql_types::{Nullable, Text};
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RepositoryError, ServiceRepository};
use crate::domain::{Service, ServiceCursorKey, ServiceFilter, ServiceId, ServiceStatus, UserId};

use super::error_mapping::map_diesel_error;
use super::models::{ServiceRow, convert_rows, tally_rows};
use super::pool::DbPool;
use super::schema::services;

diesel::define_sql_function! {
    /// SQL `COALESCE` for optional translations.
    fn coalesce(value: Nullable<Text>, fallback: Text) -> Text;
}

/// Diesel implementation of [`ServiceRepository`].
#[derive(Clone)]
pub struct DieselServiceRepository {
    pool: DbPool,
}

impl DieselServiceRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// `ILIKE` pattern matching `needle` literally anywhere in the column.
fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl ServiceRepository for DieselServiceRepository {
    async fn insert(&self, service: &Service) -> Result<(), RepositoryError> {
        let mut conn = self.pool.connection().await?;
        diesel::insert_into(services::table)
            .values(ServiceRow::from(service))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, service: &Service) -> Result<(), RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let updated = diesel::update(services::table.filter(services::id.eq(service.id.as_uuid())))
            .set(ServiceRow::from(service))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(RepositoryError::missing(format!("service {}", service.id)));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: ServiceId) -> Result<Option<Service>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let row = services::table
            .filter(services::id.eq(id.as_uuid()))
            .select(ServiceRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Service::try_from).transpose()
    }

    async fn search(
        &self,
        filter: &ServiceFilter,
        after: Option<ServiceCursorKey>,
        limit: usize,
    ) -> Result<Vec<Service>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let mut query = services::table
            .filter(services::status.eq(ServiceStatus::Approved.as_str()))
            .select(ServiceRow::as_select())
            .order_by((services::created_at.desc(), services::id.desc()))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .into_boxed();
        if let Some(category) = &filter.category {
            query = query.filter(services::category.eq(category.as_ref().to_owned()));
        }
        if let Some(min) = filter.min_price {
            query = query.filter(services::price_minor.ge(min));
        }
        if let Some(max) = filter.max_price {
            query = query.filter(services::price_minor.le(max));
        }
        if let Some(needle) = &filter.query {
            let pattern = contains_pattern(needle);
            query = query.filter(
                services::title_en
                    .ilike(pattern.clone())
                    .or(services::description_en.ilike(pattern.clone()))
                    .or(coalesce(services::title_ar, "").ilike(pattern.clone()))
                    .or(coalesce(services::description_ar, "").ilike(pattern)),
            );
        }
        if let Some(key) = after {
            let id = *key.id.as_uuid();
            query = query.filter(
                services::created_at.lt(key.created_at).or(services::created_at
                    .eq(key.created_at)
                    .and(services::id.lt(id))),
            );
        }
        let rows = query.load(&mut conn).await.map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn list_by_provider(&self, provider: UserId) -> Result<Vec<Service>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let rows = services::table
            .filter(services::provider_id.eq(provider.as_uuid()))
            .select(ServiceRow::as_select())
            .order_by(services::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn list_by_status(&self, status: ServiceStatus) -> Result<Vec<Service>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let rows = services::table
            .filter(services::status.eq(status.as_str()))
            .select(ServiceRow::as_select())
            .order_by(services::updated_at.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn count_by_status(&self) -> Result<Vec<(ServiceStatus, u64)>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let rows: Vec<(String, i64)> = services::table
            .group_by(services::status)
            .select((services::status, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        tally_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;
    use rstest::rstest;

    #[rstest]
    #[case("clean", "%clean%")]
    #[case("50%", "%50\\%%")]
    #[case("a_b", "%a\\_b%")]
    fn search_terms_are_matched_literally(#[case] needle: &str, #[case] expected: &str) {
        assert_eq!(contains_pattern(needle), expected);
    }
}
