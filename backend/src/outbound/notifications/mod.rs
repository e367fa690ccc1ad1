//! In-process fan-out of notifications to live WebSocket sessions.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::Notification;
use crate::domain::ports::{NotificationFeed, NotificationPublisher};

/// Buffered events per subscriber before slow sessions start lagging.
pub const HUB_CAPACITY: usize = 256;

/// Broadcast hub shared by the publisher port and WebSocket sessions.
///
/// Every session receives every event and filters by recipient, so the hub
/// holds no per-user state.
#[derive(Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<Arc<Notification>>,
}

impl NotificationHub {
    /// Hub with [`HUB_CAPACITY`] slots.
    pub fn new() -> Self {
        Self::with_capacity(HUB_CAPACITY)
    }

    /// Hub buffering `capacity` events before slow sessions lag; at least one.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Number of connected sessions.
    pub fn subscribers(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationPublisher for NotificationHub {
    fn publish(&self, notification: &Notification) {
        // No receivers is the common case when the recipient is offline.
        if self.sender.send(Arc::new(notification.clone())).is_err() {
            trace!(user_id = %notification.user_id, "no live sessions for notification");
        }
    }
}

impl NotificationFeed for NotificationHub {
    fn subscribe(&self) -> broadcast::Receiver<Arc<Notification>> {
        self.sender.subscribe()
    }
}
