//! Bookings and their lifecycle.
//!
//! ```text
//! pending ──accept──▶ accepted ──start──▶ in_progress ──complete──▶ completed
//!    │                   │
//!    └──cancel──▶ cancelled ◀──cancel──┘
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BookingId, Money, ServiceId, UserId};

/// Maximum length of booking notes.
pub const NOTES_MAX: usize = 500;
/// Minimum length of a trimmed cancellation reason.
pub const CANCEL_REASON_MIN: usize = 10;
/// Maximum length of a cancellation reason.
pub const CANCEL_REASON_MAX: usize = 500;

/// Validation failures for booking input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingValidationError {
    /// Notes exceed [`NOTES_MAX`].
    #[error("notes must be at most {NOTES_MAX} characters")]
    NotesTooLong,
    /// Reason shorter than [`CANCEL_REASON_MIN`] or longer than [`CANCEL_REASON_MAX`].
    #[error(
        "cancellation reason must be between {CANCEL_REASON_MIN} and {CANCEL_REASON_MAX} characters"
    )]
    CancelReasonLength,
    /// Requested time is not in the future.
    #[error("scheduledAt must be in the future")]
    ScheduledInPast,
}

impl BookingValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::NotesTooLong => "notes",
            Self::CancelReasonLength => "reason",
            Self::ScheduledInPast => "scheduledAt",
        }
    }
}

/// Lifecycle status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Accepted,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Target status of `action` from `self`, if the transition is legal.
    pub fn apply(self, action: BookingAction) -> Result<Self, TransitionError> {
        let next = match (self, action) {
            (Self::Pending, BookingAction::Accept) => Self::Accepted,
            (Self::Accepted, BookingAction::Start) => Self::InProgress,
            (Self::InProgress, BookingAction::Complete) => Self::Completed,
            (Self::Pending | Self::Accepted, BookingAction::Cancel) => Self::Cancelled,
            (from, action) => return Err(TransitionError { from, action }),
        };
        Ok(next)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown booking status: {s}"))
    }
}

/// Commands that move a booking through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingAction {
    Accept,
    Start,
    Complete,
    Cancel,
}

impl BookingAction {
    /// Verb used in error messages and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        }
    }
}

/// Illegal lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {} a booking that is {from}", action.as_str())]
pub struct TransitionError {
    /// Status the booking was in.
    pub from: BookingStatus,
    /// Rejected command.
    pub action: BookingAction,
}

/// Which side of a booking a user is looking from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingParty {
    #[default]
    Client,
    Provider,
}

/// Who cancelled and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    /// User that cancelled.
    pub by: UserId,
    /// Trimmed reason.
    pub reason: String,
}

/// Scheduled engagement between a client and a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub service_id: ServiceId,
    pub client_id: UserId,
    pub provider_id: UserId,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Service price captured when the booking was made.
    pub price: Money,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<Cancellation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Whether `user` is the client or the provider.
    pub fn is_participant(&self, user: UserId) -> bool {
        self.client_id == user || self.provider_id == user
    }

    /// The other participant, from `actor`'s point of view.
    pub fn counterpart_of(&self, actor: UserId) -> UserId {
        if actor == self.client_id {
            self.provider_id
        } else {
            self.client_id
        }
    }

    /// Move to the status reached by `action`, stamping `updated_at`.
    pub fn transition(
        &mut self,
        action: BookingAction,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.status = self.status.apply(action)?;
        self.updated_at = now;
        Ok(())
    }
}

/// Validated booking request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub service_id: ServiceId,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl BookingRequest {
    /// Validate the requested slot against `now` and trim the notes.
    pub fn new(
        service_id: ServiceId,
        scheduled_at: DateTime<Utc>,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, BookingValidationError> {
        if scheduled_at <= now {
            return Err(BookingValidationError::ScheduledInPast);
        }
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());
        if notes.is_some_and(|n| n.chars().count() > NOTES_MAX) {
            return Err(BookingValidationError::NotesTooLong);
        }
        Ok(Self {
            service_id,
            scheduled_at,
            notes: notes.map(str::to_owned),
        })
    }
}

/// Trimmed cancellation reason of acceptable length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelReason(String);

impl CancelReason {
    /// Validate a raw reason.
    pub fn new(raw: &str) -> Result<Self, BookingValidationError> {
        let trimmed = raw.trim();
        let length = trimmed.chars().count();
        if !(CANCEL_REASON_MIN..=CANCEL_REASON_MAX).contains(&length) {
            return Err(BookingValidationError::CancelReasonLength);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Reason text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Owned reason text.
    pub fn into_inner(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    #[rstest]
    #[case(BookingStatus::Pending, BookingAction::Accept, Ok(BookingStatus::Accepted))]
    #[case(BookingStatus::Accepted, BookingAction::Start, Ok(BookingStatus::InProgress))]
    #[case(BookingStatus::InProgress, BookingAction::Complete, Ok(BookingStatus::Completed))]
    #[case(BookingStatus::Pending, BookingAction::Cancel, Ok(BookingStatus::Cancelled))]
    #[case(BookingStatus::Accepted, BookingAction::Cancel, Ok(BookingStatus::Cancelled))]
    #[case(BookingStatus::Pending, BookingAction::Start, Err(()))]
    #[case(BookingStatus::Accepted, BookingAction::Complete, Err(()))]
    #[case(BookingStatus::InProgress, BookingAction::Cancel, Err(()))]
    #[case(BookingStatus::Completed, BookingAction::Cancel, Err(()))]
    #[case(BookingStatus::Cancelled, BookingAction::Cancel, Err(()))]
    #[case(BookingStatus::Cancelled, BookingAction::Accept, Err(()))]
    fn lifecycle_transitions(
        #[case] from: BookingStatus,
        #[case] action: BookingAction,
        #[case] expected: Result<BookingStatus, ()>,
    ) {
        assert_eq!(from.apply(action).map_err(|_| ()), expected);
    }

    #[rstest]
    fn transition_error_names_the_action() {
        let err = BookingStatus::Completed
            .apply(BookingAction::Cancel)
            .expect_err("illegal");
        assert_eq!(err.to_string(), "cannot cancel a booking that is completed");
    }

    #[rstest]
    #[case("too short", false)]
    #[case("  short   ", false)]
    #[case("schedule conflict", true)]
    #[case("  غير متاح في هذا الوقت  ", true)]
    fn cancel_reason_length(#[case] raw: &str, #[case] valid: bool) {
        assert_eq!(CancelReason::new(raw).is_ok(), valid);
    }

    #[rstest]
    fn request_rejects_past_slots() {
        let now = Utc::now();
        let err = BookingRequest::new(ServiceId::random(), now - Duration::minutes(1), None, now)
            .expect_err("past slot");
        assert_eq!(err, BookingValidationError::ScheduledInPast);
    }

    #[rstest]
    fn request_rejects_long_notes() {
        let now = Utc::now();
        let notes = "n".repeat(NOTES_MAX + 1);
        let err = BookingRequest::new(
            ServiceId::random(),
            now + Duration::days(1),
            Some(&notes),
            now,
        )
        .expect_err("long notes");
        assert_eq!(err.field(), "notes");
    }

    #[rstest]
    fn request_drops_blank_notes() {
        let now = Utc::now();
        let request =
            BookingRequest::new(ServiceId::random(), now + Duration::hours(2), Some("  "), now)
                .expect("valid request");
        assert_eq!(request.notes, None);
    }
}
