//! Admin moderation endpoints.
//!
//! ```text
//! GET /api/v1/admin/applications?status=pending
//! POST /api/v1/admin/applications/{id}/approve
//! POST /api/v1/admin/services/{id}/reject {"reason":"Photos missing"}
//! GET /api/v1/admin/dashboard
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    ApplicationId, ApplicationStatus, Dashboard, Decision, Error, ProviderApplication, Role,
    Service, ServiceId, User, invalid_value,
};

use super::ApiResult;
use super::auth::Authenticated;
use super::state::HttpState;
use super::validation::{FieldName, parse_id, parse_value};

const APPLICATION_ID: FieldName = FieldName::new("applicationId");
const SERVICE_ID: FieldName = FieldName::new("serviceId");

/// Rejection body shared by applications and listings.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RejectRequest {
    pub reason: String,
}

/// Status filter for the application queue.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApplicationQuery {
    pub status: Option<String>,
}

/// Role filter for the user list.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub role: Option<String>,
}

fn rejection(payload: &RejectRequest) -> Result<Decision, Error> {
    Decision::reject(&payload.reason).map_err(|err| invalid_value(err.field(), err))
}

/// Provider applications, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/api/v1/admin/applications",
    params(ApplicationQuery),
    responses(
        (status = 200, description = "Applications", body = [ProviderApplication]),
        (status = 403, description = "Admins only", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminListApplications"
)]
#[get("/admin/applications")]
pub async fn list_applications(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    query: web::Query<ApplicationQuery>,
) -> ApiResult<web::Json<Vec<ProviderApplication>>> {
    let status = query
        .status
        .as_deref()
        .map(|raw| parse_value::<ApplicationStatus>(raw, FieldName::new("status")))
        .transpose()?;
    state
        .applications
        .list(principal, status)
        .await
        .map(web::Json)
}

/// Approve a pending application; the applicant becomes a provider.
#[utoipa::path(
    post,
    path = "/api/v1/admin/applications/{id}/approve",
    params(("id" = String, Path, description = "Application id")),
    responses(
        (status = 200, description = "Approved", body = ProviderApplication),
        (status = 403, description = "Admins only", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Already decided", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminApproveApplication"
)]
#[post("/admin/applications/{id}/approve")]
pub async fn approve_application(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<ProviderApplication>> {
    let id: ApplicationId = parse_id(&path, APPLICATION_ID)?;
    state
        .applications
        .decide(principal, id, Decision::Approve)
        .await
        .map(web::Json)
}

/// Reject a pending application with a reason.
#[utoipa::path(
    post,
    path = "/api/v1/admin/applications/{id}/reject",
    params(("id" = String, Path, description = "Application id")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Rejected", body = ProviderApplication),
        (status = 400, description = "Reason missing", body = Error),
        (status = 403, description = "Admins only", body = Error),
        (status = 409, description = "Already decided", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminRejectApplication"
)]
#[post("/admin/applications/{id}/reject")]
pub async fn reject_application(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    path: web::Path<String>,
    payload: web::Json<RejectRequest>,
) -> ApiResult<web::Json<ProviderApplication>> {
    let id: ApplicationId = parse_id(&path, APPLICATION_ID)?;
    let decision = rejection(&payload)?;
    state
        .applications
        .decide(principal, id, decision)
        .await
        .map(web::Json)
}

/// Listings waiting for moderation.
#[utoipa::path(
    get,
    path = "/api/v1/admin/services/pending",
    responses(
        (status = 200, description = "Pending listings", body = [Service]),
        (status = 403, description = "Admins only", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminPendingServices"
)]
#[get("/admin/services/pending")]
pub async fn pending_services(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
) -> ApiResult<web::Json<Vec<Service>>> {
    state.admin.pending_services(principal).await.map(web::Json)
}

/// Publish a pending listing.
#[utoipa::path(
    post,
    path = "/api/v1/admin/services/{id}/approve",
    params(("id" = String, Path, description = "Service id")),
    responses(
        (status = 200, description = "Approved", body = Service),
        (status = 403, description = "Admins only", body = Error),
        (status = 409, description = "Listing not pending", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminApproveService"
)]
#[post("/admin/services/{id}/approve")]
pub async fn approve_service(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Service>> {
    let id: ServiceId = parse_id(&path, SERVICE_ID)?;
    state
        .admin
        .decide_service(principal, id, Decision::Approve)
        .await
        .map(web::Json)
}

/// Reject a pending listing with a reason.
#[utoipa::path(
    post,
    path = "/api/v1/admin/services/{id}/reject",
    params(("id" = String, Path, description = "Service id")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Rejected", body = Service),
        (status = 400, description = "Reason missing", body = Error),
        (status = 403, description = "Admins only", body = Error),
        (status = 409, description = "Listing not pending", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminRejectService"
)]
#[post("/admin/services/{id}/reject")]
pub async fn reject_service(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    path: web::Path<String>,
    payload: web::Json<RejectRequest>,
) -> ApiResult<web::Json<Service>> {
    let id: ServiceId = parse_id(&path, SERVICE_ID)?;
    let decision = rejection(&payload)?;
    state
        .admin
        .decide_service(principal, id, decision)
        .await
        .map(web::Json)
}

/// Accounts, optionally filtered by role.
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Accounts", body = [User]),
        (status = 400, description = "Unknown role", body = Error),
        (status = 403, description = "Admins only", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminListUsers"
)]
#[get("/admin/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    query: web::Query<UserQuery>,
) -> ApiResult<web::Json<Vec<User>>> {
    let role = query
        .role
        .as_deref()
        .map(|raw| parse_value::<Role>(raw, FieldName::new("role")))
        .transpose()?;
    state.admin.list_users(principal, role).await.map(web::Json)
}

/// Marketplace counters.
#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    responses(
        (status = 200, description = "Counters", body = Dashboard),
        (status = 403, description = "Admins only", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminDashboard"
)]
#[get("/admin/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
) -> ApiResult<web::Json<Dashboard>> {
    state.admin.dashboard(principal).await.map(web::Json)
}
