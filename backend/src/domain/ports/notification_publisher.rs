//! Port abstraction for live notification delivery.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::domain::Notification;

/// Pushes stored notifications to connected clients. Delivery is best
/// effort; stored notifications remain the source of truth.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationPublisher: Send + Sync {
    /// Publish `notification` to its recipient's live connections.
    fn publish(&self, notification: &Notification);
}

/// Live stream of published notifications for connected sessions.
pub trait NotificationFeed: Send + Sync {
    /// Receive every notification published from now on, for all users.
    fn subscribe(&self) -> broadcast::Receiver<Arc<Notification>>;
}
