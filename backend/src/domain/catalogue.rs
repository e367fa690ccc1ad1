//! Service listings offered by providers.
//!
//! Listings are bilingual and priced in integer minor units. New and edited
//! listings wait for admin approval before they appear in public search.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{LocalizedText, LocalizedTextError, ServiceId, UserId};

/// Maximum title length per language.
pub const TITLE_MAX: usize = 120;
/// Maximum description length per language.
pub const DESCRIPTION_MAX: usize = 2000;
/// Shortest bookable duration in minutes.
pub const DURATION_MIN: i32 = 15;
/// Longest bookable duration in minutes (one day).
pub const DURATION_MAX: i32 = 1440;

/// Validation failures raised while building listings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogueValidationError {
    /// Localized field invalid.
    #[error("{field}: {source}")]
    Text {
        /// Offending field.
        field: &'static str,
        /// Underlying text error.
        source: LocalizedTextError,
    },
    /// Category is not a lowercase slug.
    #[error("category must be a lowercase slug")]
    InvalidCategory,
    /// Negative price.
    #[error("price must not be negative")]
    NegativePrice,
    /// Currency is not a three letter ISO-4217 code.
    #[error("currency must be a three letter ISO-4217 code")]
    InvalidCurrency,
    /// Duration out of range.
    #[error("duration must be between {DURATION_MIN} and {DURATION_MAX} minutes")]
    DurationOutOfRange,
    /// Price filter bounds inverted.
    #[error("minPrice must not exceed maxPrice")]
    InvertedPriceRange,
}

impl CatalogueValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Text { field, .. } => field,
            Self::InvalidCategory => "category",
            Self::NegativePrice => "price",
            Self::InvalidCurrency => "currency",
            Self::DurationOutOfRange => "durationMinutes",
            Self::InvertedPriceRange => "minPrice",
        }
    }
}

fn text_error(field: &'static str) -> impl Fn(LocalizedTextError) -> CatalogueValidationError {
    move |source| CatalogueValidationError::Text { field, source }
}

/// Listing category such as `plumbing` or `home-cleaning`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "plumbing")]
pub struct Category(String);

impl Category {
    /// Normalise to lowercase and validate the slug alphabet.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CatalogueValidationError> {
        let value = raw.as_ref().trim().to_lowercase();
        let valid = !value.is_empty()
            && value.len() <= 48
            && !value.starts_with('-')
            && value
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-');
        if !valid {
            return Err(CatalogueValidationError::InvalidCategory);
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.0
    }
}

impl TryFrom<String> for Category {
    type Error = CatalogueValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Non-negative amount in minor units of `currency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    amount_minor: i64,
    #[schema(example = "SAR")]
    currency: String,
}

impl Money {
    /// Validate the amount and the ISO-4217 code (uppercased).
    pub fn new(
        amount_minor: i64,
        currency: impl AsRef<str>,
    ) -> Result<Self, CatalogueValidationError> {
        if amount_minor < 0 {
            return Err(CatalogueValidationError::NegativePrice);
        }
        let currency = currency.as_ref().trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(CatalogueValidationError::InvalidCurrency);
        }
        Ok(Self {
            amount_minor,
            currency,
        })
    }

    /// Amount in minor units.
    pub fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    /// Upper-case currency code.
    pub fn currency(&self) -> &str {
        self.currency.as_str()
    }
}

/// Moderation status of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Waiting for an admin decision.
    PendingApproval,
    /// Publicly searchable and bookable.
    Approved,
    /// Refused by an admin.
    Rejected,
    /// Withdrawn by its owner or an admin.
    Archived,
}

impl ServiceStatus {
    /// Every status, in dashboard order.
    pub const ALL: [Self; 4] = [
        Self::PendingApproval,
        Self::Approved,
        Self::Rejected,
        Self::Archived,
    ];

    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Archived => "archived",
        }
    }
}

impl std::str::FromStr for ServiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown service status: {s}"))
    }
}

/// Service listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Listing identifier.
    pub id: ServiceId,
    /// Owning provider.
    pub provider_id: UserId,
    /// Bilingual title.
    pub title: LocalizedText,
    /// Bilingual description.
    pub description: LocalizedText,
    /// Category slug.
    pub category: Category,
    /// Price per booking.
    pub price: Money,
    /// Expected duration.
    pub duration_minutes: i32,
    /// Moderation status.
    pub status: ServiceStatus,
    /// Admin's reason when rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Whether `viewer` may see this listing regardless of status.
    pub fn visible_to(&self, viewer: Option<UserId>, viewer_is_admin: bool) -> bool {
        self.status == ServiceStatus::Approved
            || viewer_is_admin
            || viewer.is_some_and(|id| id == self.provider_id)
    }

    /// Whether the listing matches a search filter. Status is checked by callers.
    pub fn matches(&self, filter: &ServiceFilter) -> bool {
        let amount = self.price.amount_minor();
        filter.category.as_ref().is_none_or(|c| c == &self.category)
            && filter.min_price.is_none_or(|min| amount >= min)
            && filter.max_price.is_none_or(|max| amount <= max)
            && filter.query.as_deref().is_none_or(|q| {
                self.title.contains_ignore_case(q) || self.description.contains_ignore_case(q)
            })
    }
}

/// Validated input for a new listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDraft {
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub category: Category,
    pub price: Money,
    pub duration_minutes: i32,
}

/// Raw listing fields as received from a client.
#[derive(Debug, Clone, Default)]
pub struct ServiceDraftInput<'a> {
    pub title_en: &'a str,
    pub title_ar: Option<&'a str>,
    pub description_en: &'a str,
    pub description_ar: Option<&'a str>,
    pub category: &'a str,
    pub price_minor: i64,
    pub currency: &'a str,
    pub duration_minutes: i32,
}

fn validate_duration(minutes: i32) -> Result<i32, CatalogueValidationError> {
    if (DURATION_MIN..=DURATION_MAX).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(CatalogueValidationError::DurationOutOfRange)
    }
}

impl ServiceDraft {
    /// Validate every field of a new listing.
    pub fn new(input: ServiceDraftInput<'_>) -> Result<Self, CatalogueValidationError> {
        Ok(Self {
            title: LocalizedText::new(input.title_en, input.title_ar, TITLE_MAX)
                .map_err(text_error("title"))?,
            description: LocalizedText::new(
                input.description_en,
                input.description_ar,
                DESCRIPTION_MAX,
            )
            .map_err(text_error("description"))?,
            category: Category::new(input.category)?,
            price: Money::new(input.price_minor, input.currency)?,
            duration_minutes: validate_duration(input.duration_minutes)?,
        })
    }
}

/// Partial listing edit. Absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceUpdate {
    pub title: Option<LocalizedText>,
    pub description: Option<LocalizedText>,
    pub category: Option<Category>,
    pub price_minor: Option<i64>,
    pub duration_minutes: Option<i32>,
}

impl ServiceUpdate {
    /// Validate the provided fields.
    pub fn new(
        title: Option<(&str, Option<&str>)>,
        description: Option<(&str, Option<&str>)>,
        category: Option<&str>,
        price_minor: Option<i64>,
        duration_minutes: Option<i32>,
    ) -> Result<Self, CatalogueValidationError> {
        let title = title
            .map(|(en, ar)| LocalizedText::new(en, ar, TITLE_MAX))
            .transpose()
            .map_err(text_error("title"))?;
        let description = description
            .map(|(en, ar)| LocalizedText::new(en, ar, DESCRIPTION_MAX))
            .transpose()
            .map_err(text_error("description"))?;
        let category = category.map(Category::new).transpose()?;
        if price_minor.is_some_and(|p| p < 0) {
            return Err(CatalogueValidationError::NegativePrice);
        }
        let duration_minutes = duration_minutes.map(validate_duration).transpose()?;
        Ok(Self {
            title,
            description,
            category,
            price_minor,
            duration_minutes,
        })
    }

    /// Whether no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.price_minor.is_none()
            && self.duration_minutes.is_none()
    }

    /// Apply the edit to `service`; the caller resets moderation status.
    pub fn apply_to(self, service: &mut Service) {
        if let Some(title) = self.title {
            service.title = title;
        }
        if let Some(description) = self.description {
            service.description = description;
        }
        if let Some(category) = self.category {
            service.category = category;
        }
        if let Some(amount) = self.price_minor {
            service.price.amount_minor = amount;
        }
        if let Some(minutes) = self.duration_minutes {
            service.duration_minutes = minutes;
        }
    }
}

/// Public search filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFilter {
    pub category: Option<Category>,
    pub query: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

impl ServiceFilter {
    /// Validate bounds and drop blank queries.
    pub fn new(
        category: Option<&str>,
        query: Option<&str>,
        min_price: Option<i64>,
        max_price: Option<i64>,
    ) -> Result<Self, CatalogueValidationError> {
        if min_price.is_some_and(|p| p < 0) || max_price.is_some_and(|p| p < 0) {
            return Err(CatalogueValidationError::NegativePrice);
        }
        if let (Some(min), Some(max)) = (min_price, max_price)
            && min > max
        {
            return Err(CatalogueValidationError::InvertedPriceRange);
        }
        Ok(Self {
            category: category.map(Category::new).transpose()?,
            query: query
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_owned),
            min_price,
            max_price,
        })
    }
}

/// Keyset position for newest-first listing pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCursorKey {
    pub created_at: DateTime<Utc>,
    pub id: ServiceId,
}

impl ServiceCursorKey {
    /// Key of `service`.
    pub fn of(service: &Service) -> Self {
        Self {
            created_at: service.created_at,
            id: service.id,
        }
    }

    /// Whether `service` sorts strictly after this key (newest first).
    pub fn precedes(&self, service: &Service) -> bool {
        (service.created_at, service.id.as_uuid()) < (self.created_at, self.id.as_uuid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn input() -> ServiceDraftInput<'static> {
        ServiceDraftInput {
            title_en: "Deep home cleaning",
            title_ar: Some("تنظيف عميق للمنزل"),
            description_en: "Three cleaners, all rooms.",
            description_ar: None,
            category: "Cleaning",
            price_minor: 25_000,
            currency: "sar",
            duration_minutes: 180,
        }
    }

    #[fixture]
    fn service() -> Service {
        let draft = ServiceDraft::new(input()).expect("valid draft");
        let now = Utc::now();
        Service {
            id: ServiceId::random(),
            provider_id: UserId::random(),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            price: draft.price,
            duration_minutes: draft.duration_minutes,
            status: ServiceStatus::Approved,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    fn draft_normalises_category_and_currency() {
        let draft = ServiceDraft::new(input()).expect("valid draft");
        assert_eq!(draft.category.as_ref(), "cleaning");
        assert_eq!(draft.price.currency(), "SAR");
    }

    #[rstest]
    #[case(ServiceDraftInput { price_minor: -1, ..input() }, "price")]
    #[case(ServiceDraftInput { duration_minutes: 10, ..input() }, "durationMinutes")]
    #[case(ServiceDraftInput { duration_minutes: 1441, ..input() }, "durationMinutes")]
    #[case(ServiceDraftInput { title_en: "  ", ..input() }, "title")]
    #[case(ServiceDraftInput { currency: "riyal", ..input() }, "currency")]
    #[case(ServiceDraftInput { category: "home cleaning", ..input() }, "category")]
    fn draft_rejects_invalid_fields(
        #[case] input: ServiceDraftInput<'static>,
        #[case] field: &str,
    ) {
        let err = ServiceDraft::new(input).expect_err("invalid draft");
        assert_eq!(err.field(), field);
    }

    #[rstest]
    fn zero_price_is_allowed() {
        assert!(Money::new(0, "USD").is_ok());
    }

    #[rstest]
    #[case(ServiceFilter::default(), true)]
    #[case(ServiceFilter::new(None, Some("CLEANING"), None, None).expect("filter"), true)]
    #[case(ServiceFilter::new(None, Some("تنظيف"), None, None).expect("filter"), true)]
    #[case(ServiceFilter::new(Some("plumbing"), None, None, None).expect("filter"), false)]
    #[case(ServiceFilter::new(None, None, Some(30_000), None).expect("filter"), false)]
    #[case(ServiceFilter::new(None, None, None, Some(25_000)).expect("filter"), true)]
    fn filter_matching(service: Service, #[case] filter: ServiceFilter, #[case] expected: bool) {
        assert_eq!(service.matches(&filter), expected);
    }

    #[rstest]
    fn filter_rejects_inverted_range() {
        let err = ServiceFilter::new(None, None, Some(10), Some(5)).expect_err("inverted");
        assert_eq!(err, CatalogueValidationError::InvertedPriceRange);
    }

    #[rstest]
    fn unapproved_listings_are_hidden_from_strangers(mut service: Service) {
        service.status = ServiceStatus::PendingApproval;
        assert!(!service.visible_to(None, false));
        assert!(!service.visible_to(Some(UserId::random()), false));
        assert!(service.visible_to(Some(service.provider_id), false));
        assert!(service.visible_to(None, true));
    }

    #[rstest]
    fn update_applies_only_supplied_fields(mut service: Service) {
        let update = ServiceUpdate::new(None, None, None, Some(1_000), None).expect("update");
        assert!(!update.is_empty());
        update.apply_to(&mut service);
        assert_eq!(service.price.amount_minor(), 1_000);
        assert_eq!(service.title.en(), "Deep home cleaning");
    }
}
