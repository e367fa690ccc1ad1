//! Booking endpoints.
//!
//! ```text
//! POST /api/v1/bookings {"serviceId":"...","scheduledAt":"2026-05-01T10:00:00Z"}
//! GET /api/v1/bookings?as=provider&status=pending
//! POST /api/v1/bookings/{id}/accept
//! POST /api/v1/bookings/{id}/cancel {"reason":"Schedule changed, sorry"}
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Booking, BookingAction, BookingId, BookingParty, BookingStatus, CancelReason, Error,
    Principal, ServiceId, invalid_value,
};

use super::ApiResult;
use super::auth::Authenticated;
use super::state::HttpState;
use super::validation::{FieldName, parse_id, parse_value};

const BOOKING_ID: FieldName = FieldName::new("bookingId");

/// New booking body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub service_id: String,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Cancellation body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CancelBookingRequest {
    /// At least 10 characters after trimming.
    pub reason: String,
}

/// Listing filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingListQuery {
    /// `client` (default) or `provider`.
    #[serde(rename = "as", default)]
    #[param(rename = "as")]
    pub party: Option<BookingParty>,
    /// Lifecycle status filter.
    pub status: Option<String>,
}

/// Book an approved service.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking pending provider acceptance", body = Booking),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Service not bookable", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "createBooking"
)]
#[post("/bookings")]
pub async fn create_booking(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    payload: web::Json<CreateBookingRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let service_id: ServiceId = parse_id(&body.service_id, FieldName::new("serviceId"))?;
    let booking = state
        .bookings
        .create(principal, service_id, body.scheduled_at, body.notes.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(booking))
}

/// Bookings the caller made (`as=client`) or received (`as=provider`).
#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    params(BookingListQuery),
    responses(
        (status = 200, description = "Bookings", body = [Booking]),
        (status = 400, description = "Invalid filter", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "listBookings"
)]
#[get("/bookings")]
pub async fn list_bookings(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    query: web::Query<BookingListQuery>,
) -> ApiResult<web::Json<Vec<Booking>>> {
    let status = query
        .status
        .as_deref()
        .map(|raw| parse_value::<BookingStatus>(raw, FieldName::new("status")))
        .transpose()?;
    state
        .bookings
        .list(principal, query.party.unwrap_or_default(), status)
        .await
        .map(web::Json)
}

/// A booking visible to its participants and admins.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking", body = Booking),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "getBooking"
)]
#[get("/bookings/{id}")]
pub async fn get_booking(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Booking>> {
    let id: BookingId = parse_id(&path, BOOKING_ID)?;
    state.bookings.get(principal, id).await.map(web::Json)
}

async fn advance(
    state: &HttpState,
    principal: Principal,
    raw_id: &str,
    action: BookingAction,
) -> ApiResult<web::Json<Booking>> {
    let id: BookingId = parse_id(raw_id, BOOKING_ID)?;
    state
        .bookings
        .advance(principal, id, action)
        .await
        .map(web::Json)
}

/// Provider accepts a pending booking.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/accept",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Accepted", body = Booking),
        (status = 403, description = "Not the provider", body = Error),
        (status = 409, description = "Invalid transition", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "acceptBooking"
)]
#[post("/bookings/{id}/accept")]
pub async fn accept_booking(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Booking>> {
    advance(&state, principal, &path, BookingAction::Accept).await
}

/// Provider starts an accepted booking.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/start",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "In progress", body = Booking),
        (status = 403, description = "Not the provider", body = Error),
        (status = 409, description = "Invalid transition", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "startBooking"
)]
#[post("/bookings/{id}/start")]
pub async fn start_booking(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Booking>> {
    advance(&state, principal, &path, BookingAction::Start).await
}

/// Provider completes a booking in progress.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/complete",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Completed", body = Booking),
        (status = 403, description = "Not the provider", body = Error),
        (status = 409, description = "Invalid transition", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "completeBooking"
)]
#[post("/bookings/{id}/complete")]
pub async fn complete_booking(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Booking>> {
    advance(&state, principal, &path, BookingAction::Complete).await
}

/// Either participant cancels a pending or accepted booking.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    params(("id" = String, Path, description = "Booking id")),
    request_body = CancelBookingRequest,
    responses(
        (status = 200, description = "Cancelled", body = Booking),
        (status = 400, description = "Reason too short", body = Error),
        (status = 403, description = "Not a participant", body = Error),
        (status = 409, description = "Booking can no longer be cancelled", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "cancelBooking"
)]
#[post("/bookings/{id}/cancel")]
pub async fn cancel_booking(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    path: web::Path<String>,
    payload: web::Json<CancelBookingRequest>,
) -> ApiResult<web::Json<Booking>> {
    let id: BookingId = parse_id(&path, BOOKING_ID)?;
    let reason = CancelReason::new(&payload.reason).map_err(|err| invalid_value(err.field(), err))?;
    state
        .bookings
        .cancel(principal, id, reason)
        .await
        .map(web::Json)
}
