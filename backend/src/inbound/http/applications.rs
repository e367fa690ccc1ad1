//! Provider application endpoints for applicants. Admin decisions live in
//! [`super::admin`].

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ApplicationDraft, Error, ProviderApplication, invalid_value};

use super::ApiResult;
use super::auth::Authenticated;
use super::state::HttpState;

/// Application body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub business_name: String,
    #[serde(default)]
    pub bio: Option<String>,
    /// Category slugs the provider intends to list under.
    pub categories: Vec<String>,
    pub phone: String,
}

/// Ask to become a provider.
#[utoipa::path(
    post,
    path = "/api/v1/provider-applications",
    request_body = ApplyRequest,
    responses(
        (status = 201, description = "Application pending review", body = ProviderApplication),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Admins cannot apply", body = Error),
        (status = 409, description = "Already a provider or application pending", body = Error)
    ),
    tags = ["provider-applications"],
    operation_id = "applyAsProvider"
)]
#[post("/provider-applications")]
pub async fn apply(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    payload: web::Json<ApplyRequest>,
) -> ApiResult<HttpResponse> {
    let draft = ApplicationDraft::new(
        &payload.business_name,
        payload.bio.as_deref(),
        &payload.categories,
        &payload.phone,
    )
    .map_err(|err| invalid_value(err.field(), err))?;
    let application = state.applications.apply(principal, draft).await?;
    Ok(HttpResponse::Created().json(application))
}

/// The caller's latest application.
#[utoipa::path(
    get,
    path = "/api/v1/provider-applications/me",
    responses(
        (status = 200, description = "Latest application", body = ProviderApplication),
        (status = 404, description = "No application on file", body = Error)
    ),
    tags = ["provider-applications"],
    operation_id = "myProviderApplication"
)]
#[get("/provider-applications/me")]
pub async fn my_application(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
) -> ApiResult<web::Json<ProviderApplication>> {
    state
        .applications
        .my_application(principal)
        .await
        .map(web::Json)
}
