//! Client reviews of completed bookings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BookingId, ReviewId, ServiceId, UserId};

/// Maximum comment length.
pub const COMMENT_MAX: usize = 1000;

/// Validation failures for review input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewValidationError {
    /// Rating outside 1..=5.
    #[error("rating must be between 1 and 5")]
    RatingOutOfRange,
    /// Comment longer than [`COMMENT_MAX`].
    #[error("comment must be at most {COMMENT_MAX} characters")]
    CommentTooLong,
}

impl ReviewValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::RatingOutOfRange => "rating",
            Self::CommentTooLong => "comment",
        }
    }
}

/// Star rating between 1 and 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub struct Rating(u8);

// utoipa 5 rejects `minimum`/`maximum` on unnamed struct fields, so the
// schema (i16, 1..=5) is written out by hand.
impl utoipa::PartialSchema for Rating {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        utoipa::openapi::schema::ObjectBuilder::new()
            .schema_type(utoipa::openapi::schema::Type::Integer)
            .format(Some(utoipa::openapi::schema::SchemaFormat::KnownFormat(
                utoipa::openapi::schema::KnownFormat::Int32,
            )))
            .minimum(Some(1))
            .maximum(Some(5))
            .into()
    }
}

impl ToSchema for Rating {}

impl Rating {
    /// Validate a raw rating.
    pub fn new(raw: i16) -> Result<Self, ReviewValidationError> {
        match u8::try_from(raw) {
            Ok(value @ 1..=5) => Ok(Self(value)),
            _ => Err(ReviewValidationError::RatingOutOfRange),
        }
    }

    /// Numeric value.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl From<Rating> for i16 {
    fn from(value: Rating) -> Self {
        i16::from(value.0)
    }
}

impl TryFrom<i16> for Rating {
    type Error = ReviewValidationError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Published review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub booking_id: BookingId,
    pub service_id: ServiceId,
    pub client_id: UserId,
    pub rating: Rating,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated review submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    pub booking_id: BookingId,
    pub rating: Rating,
    pub comment: Option<String>,
}

impl ReviewDraft {
    /// Validate rating and comment; blank comments are dropped.
    pub fn new(
        booking_id: BookingId,
        rating: i16,
        comment: Option<&str>,
    ) -> Result<Self, ReviewValidationError> {
        let rating = Rating::new(rating)?;
        let comment = comment.map(str::trim).filter(|c| !c.is_empty());
        if comment.is_some_and(|c| c.chars().count() > COMMENT_MAX) {
            return Err(ReviewValidationError::CommentTooLong);
        }
        Ok(Self {
            booking_id,
            rating,
            comment: comment.map(str::to_owned),
        })
    }
}

/// Rating summary for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// Number of reviews.
    pub count: u64,
    /// Mean rating rounded to one decimal; zero when there are no reviews.
    pub average: f64,
}

impl RatingSummary {
    /// Summarise `reviews`.
    pub fn of<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> Self {
        let (count, total) = reviews
            .into_iter()
            .fold((0_u64, 0_u64), |(count, total), review| {
                (count + 1, total + u64::from(review.rating.get()))
            });
        Self::from_totals(count, total)
    }

    /// Build from a count and the sum of ratings.
    pub fn from_totals(count: u64, total: u64) -> Self {
        if count == 0 {
            return Self {
                count,
                average: 0.0,
            };
        }
        let mean = total as f64 / count as f64;
        Self {
            count,
            average: (mean * 10.0).round() / 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(5, true)]
    #[case(6, false)]
    #[case(-3, false)]
    fn rating_bounds(#[case] raw: i16, #[case] valid: bool) {
        assert_eq!(Rating::new(raw).is_ok(), valid);
    }

    #[rstest]
    fn rating_schema_documents_the_star_range() {
        let schema = serde_json::to_value(<Rating as utoipa::PartialSchema>::schema())
            .expect("schema json");
        assert_eq!(schema["minimum"], 1);
        assert_eq!(schema["maximum"], 5);
    }

    #[rstest]
    fn comment_length_is_capped() {
        let comment = "c".repeat(COMMENT_MAX + 1);
        let err = ReviewDraft::new(BookingId::random(), 4, Some(&comment)).expect_err("long");
        assert_eq!(err.field(), "comment");
    }

    #[rstest]
    #[case(0, 0, 0.0)]
    #[case(3, 13, 4.3)]
    #[case(2, 9, 4.5)]
    #[case(3, 14, 4.7)]
    fn summary_rounds_to_one_decimal(#[case] count: u64, #[case] total: u64, #[case] avg: f64) {
        let summary = RatingSummary::from_totals(count, total);
        assert_eq!(summary.count, count);
        assert!((summary.average - avg).abs() < f64::EPSILON);
    }
}
