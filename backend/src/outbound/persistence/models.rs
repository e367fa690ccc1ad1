//! Internal Diesel row structs and their domain conversions.
//!
//! Rows are implementation details of the persistence layer and never leave
//! it. Reading re-runs the domain validators; a row that fails them is
//! reported as a query error rather than silently repaired.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::ports::RepositoryError;
use crate::domain::{
    ApplicationId, ApplicationStatus, Booking, BookingId, BookingStatus, Cancellation, Category,
    DisplayName, Email, Locale, LocalizedText, Money, Notification, NotificationId,
    NotificationKind, Payment, PaymentId, PaymentMethod, PaymentStatus, PhoneNumber,
    ProviderApplication, Rating, Review, ReviewId, Role, Service, ServiceId, ServiceStatus,
    StoredUser, User, UserId,
};

use super::schema::{
    bookings, notifications, payments, provider_applications, reviews, services, users,
};

fn corrupt(table: &str, id: Uuid, err: impl Display) -> RepositoryError {
    RepositoryError::query(format!("corrupt {table} row {id}: {err}"))
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: String,
    pub locale: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Profile columns a user may change.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserProfileChangeset<'a> {
    pub display_name: &'a str,
    pub locale: &'a str,
    pub phone: Option<&'a str>,
}

impl From<&StoredUser> for UserRow {
    fn from(stored: &StoredUser) -> Self {
        let user = &stored.user;
        Self {
            id: *user.id.as_uuid(),
            email: user.email.as_ref().to_owned(),
            password_hash: stored.password_hash.clone(),
            display_name: user.display_name.as_ref().to_owned(),
            role: user.role.as_str().to_owned(),
            locale: user.locale.as_str().to_owned(),
            phone: user.phone.as_ref().map(|p| p.as_ref().to_owned()),
            created_at: user.created_at,
        }
    }
}

impl TryFrom<UserRow> for StoredUser {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let user = User {
            id: UserId::from_uuid(row.id),
            email: Email::new(&row.email).map_err(|e| corrupt("users", id, e))?,
            display_name: DisplayName::new(&row.display_name)
                .map_err(|e| corrupt("users", id, e))?,
            role: row.role.parse::<Role>().map_err(|e| corrupt("users", id, e))?,
            locale: Locale::parse(&row.locale).unwrap_or_default(),
            phone: row
                .phone
                .as_deref()
                .map(PhoneNumber::new)
                .transpose()
                .map_err(|e| corrupt("users", id, e))?,
            created_at: row.created_at,
        };
        Ok(Self {
            user,
            password_hash: row.password_hash,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = services)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ServiceRow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub title_en: String,
    pub title_ar: Option<String>,
    pub description_en: String,
    pub description_ar: Option<String>,
    pub category: String,
    pub price_minor: i64,
    pub currency: String,
    pub duration_minutes: i32,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Service> for ServiceRow {
    fn from(service: &Service) -> Self {
        Self {
            id: *service.id.as_uuid(),
            provider_id: *service.provider_id.as_uuid(),
            title_en: service.title.en().to_owned(),
            title_ar: service.title.ar().map(str::to_owned),
            description_en: service.description.en().to_owned(),
            description_ar: service.description.ar().map(str::to_owned),
            category: service.category.as_ref().to_owned(),
            price_minor: service.price.amount_minor(),
            currency: service.price.currency().to_owned(),
            duration_minutes: service.duration_minutes,
            status: service.status.as_str().to_owned(),
            rejection_reason: service.rejection_reason.clone(),
            created_at: service.created_at,
            updated_at: service.updated_at,
        }
    }
}

impl TryFrom<ServiceRow> for Service {
    type Error = RepositoryError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        let id = row.id;
        Ok(Self {
            id: ServiceId::from_uuid(row.id),
            provider_id: UserId::from_uuid(row.provider_id),
            title: LocalizedText::from_stored(row.title_en, row.title_ar),
            description: LocalizedText::from_stored(row.description_en, row.description_ar),
            category: Category::new(&row.category).map_err(|e| corrupt("services", id, e))?,
            price: Money::new(row.price_minor, &row.currency)
                .map_err(|e| corrupt("services", id, e))?,
            duration_minutes: row.duration_minutes,
            status: row.status.parse::<ServiceStatus>().map_err(|e| corrupt("services", id, e))?,
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub service_id: Uuid,
    pub client_id: Uuid,
    pub provider_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub price_minor: i64,
    pub currency: String,
    pub status: String,
    pub cancelled_by: Option<Uuid>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Booking> for BookingRow {
    fn from(booking: &Booking) -> Self {
        Self {
            id: *booking.id.as_uuid(),
            service_id: *booking.service_id.as_uuid(),
            client_id: *booking.client_id.as_uuid(),
            provider_id: *booking.provider_id.as_uuid(),
            scheduled_at: booking.scheduled_at,
            notes: booking.notes.clone(),
            price_minor: booking.price.amount_minor(),
            currency: booking.price.currency().to_owned(),
            status: booking.status.as_str().to_owned(),
            cancelled_by: booking.cancellation.as_ref().map(|c| *c.by.as_uuid()),
            cancel_reason: booking.cancellation.as_ref().map(|c| c.reason.clone()),
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

impl TryFrom<BookingRow> for Booking {
    type Error = RepositoryError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let cancellation = match (row.cancelled_by, row.cancel_reason) {
            (Some(by), Some(reason)) => Some(Cancellation {
                by: UserId::from_uuid(by),
                reason,
            }),
            _ => None,
        };
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            service_id: ServiceId::from_uuid(row.service_id),
            client_id: UserId::from_uuid(row.client_id),
            provider_id: UserId::from_uuid(row.provider_id),
            scheduled_at: row.scheduled_at,
            notes: row.notes,
            price: Money::new(row.price_minor, &row.currency)
                .map_err(|e| corrupt("bookings", id, e))?,
            status: row.status.parse::<BookingStatus>().map_err(|e| corrupt("bookings", id, e))?,
            cancellation,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct PaymentRow {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub payer_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub method: String,
    pub status: String,
    pub provider_reference: Option<String>,
    pub checkout_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Payment> for PaymentRow {
    fn from(payment: &Payment) -> Self {
        Self {
            id: *payment.id.as_uuid(),
            booking_id: *payment.booking_id.as_uuid(),
            payer_id: *payment.payer_id.as_uuid(),
            amount_minor: payment.amount.amount_minor(),
            currency: payment.amount.currency().to_owned(),
            method: payment.method.as_str().to_owned(),
            status: payment.status.as_str().to_owned(),
            provider_reference: payment.provider_reference.clone(),
            checkout_url: payment.checkout_url.clone(),
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepositoryError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let id = row.id;
        Ok(Self {
            id: PaymentId::from_uuid(row.id),
            booking_id: BookingId::from_uuid(row.booking_id),
            payer_id: UserId::from_uuid(row.payer_id),
            amount: Money::new(row.amount_minor, &row.currency)
                .map_err(|e| corrupt("payments", id, e))?,
            method: row.method.parse::<PaymentMethod>().map_err(|e| corrupt("payments", id, e))?,
            status: row.status.parse::<PaymentStatus>().map_err(|e| corrupt("payments", id, e))?,
            provider_reference: row.provider_reference,
            checkout_url: row.checkout_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReviewRow {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub service_id: Uuid,
    pub client_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Review> for ReviewRow {
    fn from(review: &Review) -> Self {
        Self {
            id: *review.id.as_uuid(),
            booking_id: *review.booking_id.as_uuid(),
            service_id: *review.service_id.as_uuid(),
            client_id: *review.client_id.as_uuid(),
            rating: i16::from(review.rating.get()),
            comment: review.comment.clone(),
            created_at: review.created_at,
        }
    }
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ReviewId::from_uuid(row.id),
            booking_id: BookingId::from_uuid(row.booking_id),
            service_id: ServiceId::from_uuid(row.service_id),
            client_id: UserId::from_uuid(row.client_id),
            rating: Rating::new(row.rating).map_err(|e| corrupt("reviews", row.id, e))?,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title_en: String,
    pub title_ar: Option<String>,
    pub body_en: String,
    pub body_ar: Option<String>,
    pub reference_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationRow {
    fn from(notification: &Notification) -> Self {
        Self {
            id: *notification.id.as_uuid(),
            user_id: *notification.user_id.as_uuid(),
            kind: notification.kind.as_str().to_owned(),
            title_en: notification.title.en().to_owned(),
            title_ar: notification.title.ar().map(str::to_owned),
            body_en: notification.body.en().to_owned(),
            body_ar: notification.body.ar().map(str::to_owned),
            reference_id: notification.reference_id,
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}

impl TryFrom<NotificationRow> for Notification {
    type Error = RepositoryError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: NotificationId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            kind: row
                .kind
                .parse::<NotificationKind>()
                .map_err(|e| corrupt("notifications", row.id, e))?,
            title: LocalizedText::from_stored(row.title_en, row.title_ar),
            body: LocalizedText::from_stored(row.body_en, row.body_ar),
            reference_id: row.reference_id,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = provider_applications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ApplicationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub bio: Option<String>,
    pub categories: Vec<String>,
    pub phone: String,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&ProviderApplication> for ApplicationRow {
    fn from(application: &ProviderApplication) -> Self {
        Self {
            id: *application.id.as_uuid(),
            user_id: *application.user_id.as_uuid(),
            business_name: application.business_name.clone(),
            bio: application.bio.clone(),
            categories: application
                .categories
                .iter()
                .map(|c| c.as_ref().to_owned())
                .collect(),
            phone: application.phone.as_ref().to_owned(),
            status: application.status.as_str().to_owned(),
            rejection_reason: application.rejection_reason.clone(),
            reviewed_by: application.reviewed_by.map(|id| *id.as_uuid()),
            reviewed_at: application.reviewed_at,
            created_at: application.created_at,
        }
    }
}

impl TryFrom<ApplicationRow> for ProviderApplication {
    type Error = RepositoryError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let categories = row
            .categories
            .iter()
            .map(Category::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| corrupt("provider_applications", id, e))?;
        Ok(Self {
            id: ApplicationId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            business_name: row.business_name,
            bio: row.bio,
            categories,
            phone: PhoneNumber::new(&row.phone)
                .map_err(|e| corrupt("provider_applications", id, e))?,
            status: row
                .status
                .parse::<ApplicationStatus>()
                .map_err(|e| corrupt("provider_applications", id, e))?,
            rejection_reason: row.rejection_reason,
            reviewed_by: row.reviewed_by.map(UserId::from_uuid),
            reviewed_at: row.reviewed_at,
            created_at: row.created_at,
        })
    }
}

/// Convert every row, failing on the first corrupt one.
pub(crate) fn convert_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, RepositoryError>
where
    T: TryFrom<R, Error = RepositoryError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Parse `(status, count)` aggregates produced by `GROUP BY`.
pub(crate) fn tally_rows<K>(rows: Vec<(String, i64)>) -> Result<Vec<(K, u64)>, RepositoryError>
where
    K: std::str::FromStr,
    K::Err: Display,
{
    rows.into_iter()
        .map(|(key, count)| {
            let key = key
                .parse::<K>()
                .map_err(|e| RepositoryError::query(format!("unknown group key {key}: {e}")))?;
            Ok((key, u64::try_from(count).unwrap_or_default()))
        })
        .collect()
}
