//! In-app notifications.
//!
//! Every notification is stored in both languages so a user who switches
//! locale still reads their history in the new language.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Locale, LocalizedText, NotificationId, UserId};

/// What the notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingRequested,
    BookingAccepted,
    BookingStarted,
    BookingCompleted,
    BookingCancelled,
    PaymentSucceeded,
    PaymentFailed,
    ReviewReceived,
    ApplicationApproved,
    ApplicationRejected,
    ServiceApproved,
    ServiceRejected,
}

impl NotificationKind {
    /// Every kind.
    pub const ALL: [Self; 12] = [
        Self::BookingRequested,
        Self::BookingAccepted,
        Self::BookingStarted,
        Self::BookingCompleted,
        Self::BookingCancelled,
        Self::PaymentSucceeded,
        Self::PaymentFailed,
        Self::ReviewReceived,
        Self::ApplicationApproved,
        Self::ApplicationRejected,
        Self::ServiceApproved,
        Self::ServiceRejected,
    ];

    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BookingRequested => "booking_requested",
            Self::BookingAccepted => "booking_accepted",
            Self::BookingStarted => "booking_started",
            Self::BookingCompleted => "booking_completed",
            Self::BookingCancelled => "booking_cancelled",
            Self::PaymentSucceeded => "payment_succeeded",
            Self::PaymentFailed => "payment_failed",
            Self::ReviewReceived => "review_received",
            Self::ApplicationApproved => "application_approved",
            Self::ApplicationRejected => "application_rejected",
            Self::ServiceApproved => "service_approved",
            Self::ServiceRejected => "service_rejected",
        }
    }

    /// Bilingual title and body for this kind.
    fn template(self) -> (LocalizedText, LocalizedText) {
        let (title_en, title_ar, body_en, body_ar) = match self {
            Self::BookingRequested => (
                "New booking request",
                "طلب حجز جديد",
                "A client requested one of your services.",
                "طلب عميل إحدى خدماتك.",
            ),
            Self::BookingAccepted => (
                "Booking accepted",
                "تم قبول الحجز",
                "The provider accepted your booking.",
                "وافق مقدم الخدمة على حجزك.",
            ),
            Self::BookingStarted => (
                "Service started",
                "بدأت الخدمة",
                "The provider has started working on your booking.",
                "بدأ مقدم الخدمة العمل على حجزك.",
            ),
            Self::BookingCompleted => (
                "Service completed",
                "اكتملت الخدمة",
                "Your booking is complete. You can now leave a review.",
                "اكتمل حجزك. يمكنك الآن كتابة تقييم.",
            ),
            Self::BookingCancelled => (
                "Booking cancelled",
                "تم إلغاء الحجز",
                "A booking you are part of was cancelled.",
                "تم إلغاء حجز أنت طرف فيه.",
            ),
            Self::PaymentSucceeded => (
                "Payment received",
                "تم استلام الدفع",
                "Payment for the booking was completed.",
                "تم إتمام الدفع للحجز.",
            ),
            Self::PaymentFailed => (
                "Payment failed",
                "فشل الدفع",
                "The payment could not be completed. Please try again.",
                "تعذر إتمام الدفع. يرجى المحاولة مرة أخرى.",
            ),
            Self::ReviewReceived => (
                "New review",
                "تقييم جديد",
                "A client reviewed one of your services.",
                "قيّم عميل إحدى خدماتك.",
            ),
            Self::ApplicationApproved => (
                "Application approved",
                "تمت الموافقة على طلبك",
                "You are now a provider and can publish services.",
                "أصبحت الآن مقدم خدمة ويمكنك نشر خدماتك.",
            ),
            Self::ApplicationRejected => (
                "Application rejected",
                "تم رفض طلبك",
                "Your provider application was not approved.",
                "لم تتم الموافقة على طلبك لتصبح مقدم خدمة.",
            ),
            Self::ServiceApproved => (
                "Service approved",
                "تمت الموافقة على الخدمة",
                "Your service is now visible to clients.",
                "أصبحت خدمتك مرئية للعملاء.",
            ),
            Self::ServiceRejected => (
                "Service rejected",
                "تم رفض الخدمة",
                "Your service was not approved.",
                "لم تتم الموافقة على خدمتك.",
            ),
        };
        (
            LocalizedText::from_pair(title_en, title_ar),
            LocalizedText::from_pair(body_en, body_ar),
        )
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown notification kind: {s}"))
    }
}

/// Stored notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: LocalizedText,
    pub body: LocalizedText,
    /// Booking, payment, application or service the notification refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Build an unread notification from the kind's template.
    pub fn from_template(
        user_id: UserId,
        kind: NotificationKind,
        reference_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::with_note(user_id, kind, reference_id, None, now)
    }

    /// Like [`Self::from_template`], appending `note` (for example a
    /// rejection reason) to both bodies.
    pub fn with_note(
        user_id: UserId,
        kind: NotificationKind,
        reference_id: Option<Uuid>,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let (title, body) = kind.template();
        let body = match note {
            Some(note) => LocalizedText::from_pair(
                format!("{} {note}", body.en()),
                format!("{} {note}", body.get(Locale::Ar)),
            ),
            None => body,
        };
        Self {
            id: NotificationId::random(),
            user_id,
            kind,
            title,
            body,
            reference_id,
            read: false,
            created_at: now,
        }
    }

    /// Title and body in `locale`.
    pub fn render(&self, locale: Locale) -> (&str, &str) {
        (self.title.get(locale), self.body.get(locale))
    }
}
