//! Notification inbox endpoints. Live delivery happens over `/ws/notifications`.

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Error, Notification, NotificationId};

use super::ApiResult;
use super::auth::Authenticated;
use super::state::HttpState;
use super::validation::{FieldName, parse_id};

/// Inbox filter.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}

/// Result of `read-all`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MarkedRead {
    /// Notifications that changed from unread to read.
    pub updated: u64,
}

/// The caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(NotificationQuery),
    responses(
        (status = 200, description = "Notifications", body = [Notification]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    query: web::Query<NotificationQuery>,
) -> ApiResult<web::Json<Vec<Notification>>> {
    state
        .notifications
        .list(principal.user_id, query.unread_only)
        .await
        .map(web::Json)
}

/// Mark every notification read. Registered before `/{id}/read`.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    responses(
        (status = 200, description = "Count of updated notifications", body = MarkedRead),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markAllNotificationsRead"
)]
#[post("/notifications/read-all")]
pub async fn mark_all_read(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
) -> ApiResult<web::Json<MarkedRead>> {
    let updated = state.notifications.mark_all_read(principal.user_id).await?;
    Ok(web::Json(MarkedRead { updated }))
}

/// Mark one of the caller's notifications read.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Updated notification", body = Notification),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationRead"
)]
#[post("/notifications/{id}/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Notification>> {
    let id: NotificationId = parse_id(&path, FieldName::new("notificationId"))?;
    state
        .notifications
        .mark_read(principal.user_id, id)
        .await
        .map(web::Json)
}
