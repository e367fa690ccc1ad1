//! PostgreSQL-backed `NotificationRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{NotificationRepository, RepositoryError};
use crate::domain::{Notification, NotificationId, UserId};

use super::error_mapping::map_diesel_error;
use super::models::{NotificationRow, convert_rows};
use super::pool::DbPool;
use super::schema::notifications;

/// Diesel implementation of [`NotificationRepository`].
#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<(), RepositoryError> {
        let mut conn = self.pool.connection().await?;
        diesel::insert_into(notifications::table)
            .values(NotificationRow::from(notification))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_for(
        &self,
        user: UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let mut query = notifications::table
            .filter(notifications::user_id.eq(*user.as_uuid()))
            .select(NotificationRow::as_select())
            .order_by(notifications::created_at.desc())
            .into_boxed();
        if unread_only {
            query = query.filter(notifications::read.eq(false));
        }
        let rows = query.load(&mut conn).await.map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> Result<Option<Notification>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let row = diesel::update(
            notifications::table
                .filter(notifications::id.eq(id.as_uuid()))
                .filter(notifications::user_id.eq(user.as_uuid())),
        )
        .set(notifications::read.eq(true))
        .returning(NotificationRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        row.map(Notification::try_from).transpose()
    }

    async fn mark_all_read(&self, user: UserId) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let updated = diesel::update(
            notifications::table
                .filter(notifications::user_id.eq(user.as_uuid()))
                .filter(notifications::read.eq(false)),
        )
        .set(notifications::read.eq(true))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(u64::try_from(updated).unwrap_or_default())
    }
}
