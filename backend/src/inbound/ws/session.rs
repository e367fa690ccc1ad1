//! One live notification socket.
//!
//! The socket forwards hub events addressed to its user, answers JSON pings
//! and sends protocol pings every 5s. A client that stays silent for 10s is
//! disconnected. Tests shrink both intervals.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tokio::time;
use tracing::{debug, info, warn};

use crate::domain::{Locale, Notification, UserId};
use crate::inbound::ws::messages::{ClientMessage, ServerMessage};

#[cfg(not(test))]
const PING_EVERY: Duration = Duration::from_secs(5);
#[cfg(test)]
const PING_EVERY: Duration = Duration::from_millis(50);

#[cfg(not(test))]
const IDLE_LIMIT: Duration = Duration::from_secs(10);
#[cfg(test)]
const IDLE_LIMIT: Duration = Duration::from_millis(100);

/// Why the loop stopped.
#[derive(Debug)]
enum Shutdown {
    ClientClosed(Option<CloseReason>),
    Disconnected,
    Idle,
    BadFrame,
    Protocol(ProtocolError),
    Send(Closed),
    HubGone,
}

impl Shutdown {
    /// Close frame to send, or `None` when the transport is already gone.
    fn close_reason(&self) -> Option<Option<CloseReason>> {
        let frame = |code, text: &str| {
            Some(Some(CloseReason {
                code,
                description: Some(text.to_owned()),
            }))
        };
        match self {
            Self::ClientClosed(reason) => Some(reason.clone()),
            Self::Idle => frame(CloseCode::Normal, "heartbeat timeout"),
            Self::BadFrame => frame(CloseCode::Policy, "invalid payload"),
            Self::Protocol(_) => frame(CloseCode::Protocol, "protocol error"),
            Self::HubGone => frame(CloseCode::Away, "server shutting down"),
            Self::Disconnected | Self::Send(_) => None,
        }
    }
}

type Step = Result<(), Shutdown>;

struct NotificationSocket {
    user: UserId,
    locale: Locale,
    session: Session,
    last_seen: Instant,
}

/// Drive the socket until either side hangs up.
pub(super) async fn handle_ws_session(
    user: UserId,
    locale: Locale,
    mut events: Receiver<Arc<Notification>>,
    session: Session,
    mut frames: MessageStream,
) {
    let mut socket = NotificationSocket {
        user,
        locale,
        session,
        last_seen: Instant::now(),
    };
    let mut pings = time::interval(PING_EVERY);
    debug!(user_id = %user, %locale, "notification socket opened");

    let reason = loop {
        let step = tokio::select! {
            _ = pings.tick() => socket.keep_alive().await,
            frame = frames.recv() => socket.on_frame(frame).await,
            event = events.recv() => socket.on_event(event).await,
        };
        if let Err(reason) = step {
            break reason;
        }
    };
    socket.finish(reason).await;
}

impl NotificationSocket {
    async fn keep_alive(&mut self) -> Step {
        if self.last_seen.elapsed() > IDLE_LIMIT {
            return Err(Shutdown::Idle);
        }
        self.session.ping(b"").await.map_err(Shutdown::Send)
    }

    async fn on_frame(&mut self, frame: Option<Result<Message, ProtocolError>>) -> Step {
        let message = match frame {
            None => return Err(Shutdown::Disconnected),
            Some(Err(error)) => return Err(Shutdown::Protocol(error)),
            Some(Ok(message)) => message,
        };
        if let Message::Close(reason) = message {
            return Err(Shutdown::ClientClosed(reason));
        }
        self.last_seen = Instant::now();
        match message {
            Message::Ping(bytes) => self.session.pong(&bytes).await.map_err(Shutdown::Send),
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Ping) => self.send(&ServerMessage::Pong).await,
                Err(error) => {
                    warn!(user_id = %self.user, %error, "rejecting malformed client frame");
                    Err(Shutdown::BadFrame)
                }
            },
            Message::Binary(_) => Err(Shutdown::BadFrame),
            _ => Ok(()),
        }
    }

    async fn on_event(&mut self, event: Result<Arc<Notification>, RecvError>) -> Step {
        match event {
            Ok(notification) if notification.user_id == self.user => {
                self.send(&ServerMessage::notification(&notification, self.locale))
                    .await
            }
            Ok(_) => Ok(()),
            Err(RecvError::Lagged(missed)) => {
                warn!(user_id = %self.user, missed, "socket fell behind the notification hub");
                self.send(&ServerMessage::Resync { missed }).await
            }
            Err(RecvError::Closed) => Err(Shutdown::HubGone),
        }
    }

    async fn send(&mut self, message: &ServerMessage<'_>) -> Step {
        let body = match serde_json::to_string(message) {
            Ok(body) => body,
            Err(error) => {
                warn!(%error, "dropping unserialisable socket message");
                return Ok(());
            }
        };
        self.session.text(body).await.map_err(Shutdown::Send)
    }

    async fn finish(self, reason: Shutdown) {
        match &reason {
            Shutdown::Idle | Shutdown::HubGone | Shutdown::Protocol(_) | Shutdown::Send(_) => {
                info!(user_id = %self.user, ?reason, "closing notification socket");
            }
            Shutdown::ClientClosed(_) | Shutdown::Disconnected | Shutdown::BadFrame => {
                debug!(user_id = %self.user, ?reason, "notification socket closed");
            }
        }
        let Some(frame) = reason.close_reason() else {
            return;
        };
        if let Err(error) = self.session.close(frame).await {
            debug!(%error, "close frame not delivered");
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
