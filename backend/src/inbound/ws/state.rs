//! Shared WebSocket adapter state.

use std::sync::Arc;

use crate::domain::AccountService;
use crate::domain::ports::NotificationFeed;

use super::origin::AllowedOrigins;

/// Dependency bundle for the notification socket.
#[derive(Clone)]
pub struct WsState {
    pub feed: Arc<dyn NotificationFeed>,
    pub accounts: AccountService,
    pub origins: Arc<AllowedOrigins>,
}

impl WsState {
    pub fn new(
        feed: Arc<dyn NotificationFeed>,
        accounts: AccountService,
        origins: AllowedOrigins,
    ) -> Self {
        Self {
            feed,
            accounts,
            origins: Arc::new(origins),
        }
    }
}
