//! Notification inbox and live delivery.

use std::sync::Arc;

use mockable::Clock;
use tracing::warn;
use uuid::Uuid;

use super::ports::{NotificationPublisher, NotificationRepository};
use super::service_support::map_repository_error;
use super::{Error, Notification, NotificationId, NotificationKind, UserId};

/// Stores notifications and pushes them to connected clients.
#[derive(Clone)]
pub struct NotificationService {
    repository: Arc<dyn NotificationRepository>,
    publisher: Arc<dyn NotificationPublisher>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    /// Wire the service to its ports.
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        publisher: Arc<dyn NotificationPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            publisher,
            clock,
        }
    }

    /// Persist and publish a templated notification.
    ///
    /// Called after the triggering state change has been stored, so failures
    /// are logged rather than returned.
    pub async fn notify(
        &self,
        user: UserId,
        kind: NotificationKind,
        reference: Option<Uuid>,
        note: Option<&str>,
    ) {
        let notification = Notification::with_note(user, kind, reference, note, self.clock.utc());
        match self.repository.insert(&notification).await {
            Ok(()) => self.publisher.publish(&notification),
            Err(error) => warn!(
                %error,
                user_id = %user,
                kind = kind.as_str(),
                "failed to store notification"
            ),
        }
    }

    /// A user's notifications, newest first.
    pub async fn list(&self, user: UserId, unread_only: bool) -> Result<Vec<Notification>, Error> {
        self.repository
            .list_for(user, unread_only)
            .await
            .map_err(map_repository_error)
    }

    /// Mark one notification read; other users' ids are reported missing.
    pub async fn mark_read(
        &self,
        user: UserId,
        id: NotificationId,
    ) -> Result<Notification, Error> {
        self.repository
            .mark_read(id, user)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("notification {id} not found")))
    }

    /// Mark every notification of `user` read.
    pub async fn mark_all_read(&self, user: UserId) -> Result<u64, Error> {
        self.repository
            .mark_all_read(user)
            .await
            .map_err(map_repository_error)
    }
}
