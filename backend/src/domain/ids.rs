//! Strongly typed UUID identifiers for marketplace entities.
//!
//! Every aggregate gets its own newtype so a booking id can never be passed
//! where a service id is expected. The identifiers serialise as plain UUID
//! strings.

use thiserror::Error;

/// Raised when a raw string is not a valid identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} must be a valid UUID")]
pub struct IdParseError {
    kind: &'static str,
}

impl IdParseError {
    /// Label of the identifier that failed to parse, e.g. `booking id`.
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident => $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
            utoipa::ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Parse an identifier from its string form.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, IdParseError> {
                let raw = raw.as_ref();
                if raw.trim() != raw {
                    return Err(IdParseError { kind: $label });
                }
                uuid::Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| IdParseError { kind: $label })
            }

            /// Generate a fresh random identifier.
            pub fn random() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Wrap an existing UUID, typically one read from storage.
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

define_id! {
    /// Identifier of a registered account.
    UserId => "user id"
}
define_id! {
    /// Identifier of a service listing.
    ServiceId => "service id"
}
define_id! {
    /// Identifier of a booking.
    BookingId => "booking id"
}
define_id! {
    /// Identifier of a payment attempt.
    PaymentId => "payment id"
}
define_id! {
    /// Identifier of a review.
    ReviewId => "review id"
}
define_id! {
    /// Identifier of a notification.
    NotificationId => "notification id"
}
define_id! {
    /// Identifier of a provider application.
    ApplicationId => "application id"
}
