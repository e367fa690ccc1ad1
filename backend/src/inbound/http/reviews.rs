//! Review submission. Listing reviews are served from `services`.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{BookingId, Error, Review, ReviewDraft, invalid_value};

use super::ApiResult;
use super::auth::Authenticated;
use super::state::HttpState;
use super::validation::{FieldName, parse_id};

/// Review body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub booking_id: String,
    /// 1 to 5.
    pub rating: i16,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Review a completed booking; one review per booking.
#[utoipa::path(
    post,
    path = "/api/v1/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review stored", body = Review),
        (status = 400, description = "Invalid rating or comment", body = Error),
        (status = 403, description = "Caller is not the booking's client", body = Error),
        (status = 409, description = "Booking not completed or already reviewed", body = Error)
    ),
    tags = ["reviews"],
    operation_id = "createReview"
)]
#[post("/reviews")]
pub async fn create_review(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    payload: web::Json<CreateReviewRequest>,
) -> ApiResult<HttpResponse> {
    let booking_id: BookingId = parse_id(&payload.booking_id, FieldName::new("bookingId"))?;
    let draft = ReviewDraft::new(booking_id, payload.rating, payload.comment.as_deref())
        .map_err(|err| invalid_value(err.field(), err))?;
    let review = state.reviews.create(principal, draft).await?;
    Ok(HttpResponse::Created().json(review))
}
