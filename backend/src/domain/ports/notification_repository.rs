//! Port abstraction for notification persistence.

use async_trait::async_trait;

use crate::domain::{Notification, NotificationId, UserId};

use super::RepositoryError;

/// Notification storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a notification.
    async fn insert(&self, notification: &Notification) -> Result<(), RepositoryError>;

    /// A user's notifications, newest first.
    async fn list_for(
        &self,
        user: UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, RepositoryError>;

    /// Mark one of `user`'s notifications read. Returns the updated row, or
    /// `None` when the id does not belong to `user`.
    async fn mark_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> Result<Option<Notification>, RepositoryError>;

    /// Mark every notification of `user` read, returning how many changed.
    async fn mark_all_read(&self, user: UserId) -> Result<u64, RepositoryError>;
}
