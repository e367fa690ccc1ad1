//! Frames exchanged on `/ws/notifications`.

use serde::{Deserialize, Serialize};

use crate::domain::{Locale, Notification};

/// Client frames. Anything else closes the socket with a policy error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Application-level keepalive for clients that cannot send ping frames.
    Ping,
}

/// Server frames.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage<'a> {
    /// A new notification, with text rendered in the recipient's locale.
    Notification {
        notification: &'a Notification,
        title: &'a str,
        body: &'a str,
    },
    Pong,
    /// The session fell behind and dropped `missed` events; clients should
    /// refetch `GET /api/v1/notifications`.
    Resync { missed: u64 },
}

impl<'a> ServerMessage<'a> {
    /// Render `notification` for a reader preferring `locale`.
    pub fn notification(notification: &'a Notification, locale: Locale) -> Self {
        let (title, body) = notification.render(locale);
        Self::Notification {
            notification,
            title,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NotificationKind, UserId};
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    fn renders_in_the_reader_locale() {
        let notification = Notification::from_template(
            UserId::random(),
            NotificationKind::BookingAccepted,
            None,
            Utc::now(),
        );
        let value = serde_json::to_value(ServerMessage::notification(&notification, Locale::Ar))
            .expect("serialise");
        assert_eq!(value["type"], "notification");
        assert_eq!(value["title"], "تم قبول الحجز");
        assert_eq!(value["notification"]["kind"], "booking_accepted");
    }

    #[rstest]
    #[case(json!({"type": "ping"}), true)]
    #[case(json!({"type": "subscribe"}), false)]
    fn parses_client_frames(#[case] frame: Value, #[case] ok: bool) {
        assert_eq!(serde_json::from_value::<ClientMessage>(frame).is_ok(), ok);
    }

    #[rstest]
    fn resync_carries_the_gap() {
        let value = serde_json::to_value(ServerMessage::Resync { missed: 3 }).expect("serialise");
        assert_eq!(value, json!({"type": "resync", "missed": 3}));
    }
}
