//! Service listing endpoints.
//!
//! ```text
//! GET /api/v1/services?category=plumbing&q=leak&limit=10
//! POST /api/v1/services {"title":{"en":"Leak repair"},...}
//! GET /api/v1/services/{id}/reviews
//! ```

use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, web};
use pagination::{Cursor, PageLimit, PaginationError, next_page_url};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    CatalogueValidationError, Error, Service, ServiceCursorKey, ServiceDraft, ServiceDraftInput,
    ServiceFilter, ServiceId, ServiceReviews, ServiceUpdate, invalid_value,
};

use super::ApiResult;
use super::auth::{Authenticated, MaybeAuthenticated};
use super::state::HttpState;
use super::validation::{FieldName, parse_id};

const SERVICE_ID: FieldName = FieldName::new("serviceId");

/// Bilingual text input; Arabic is optional.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LocalizedInput {
    pub en: String,
    #[serde(default)]
    pub ar: Option<String>,
}

impl LocalizedInput {
    fn as_pair(&self) -> (&str, Option<&str>) {
        (self.en.as_str(), self.ar.as_deref())
    }
}

/// New listing body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub title: LocalizedInput,
    pub description: LocalizedInput,
    pub category: String,
    /// Price in minor units (halalas, cents).
    pub price_minor: i64,
    /// ISO-4217 code; the server default applies when absent.
    #[serde(default)]
    pub currency: Option<String>,
    pub duration_minutes: i32,
}

/// Listing edit body. Absent fields are unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    pub title: Option<LocalizedInput>,
    pub description: Option<LocalizedInput>,
    pub category: Option<String>,
    pub price_minor: Option<i64>,
    pub duration_minutes: Option<i32>,
}

/// Search filters and paging.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ServiceSearchQuery {
    /// Category slug.
    pub category: Option<String>,
    /// Free text matched against titles and descriptions in both languages.
    pub q: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Opaque cursor from a previous page.
    pub cursor: Option<String>,
    /// Page size, 1 to 100 (default 20).
    pub limit: Option<usize>,
}

/// One page of listings, newest first.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServicePage {
    pub data: Vec<Service>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    /// Absolute URL of the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

fn catalogue_error(err: CatalogueValidationError) -> Error {
    invalid_value(err.field(), err)
}

fn pagination_error(field: &str) -> impl Fn(PaginationError) -> Error + '_ {
    move |err| invalid_value(field, err)
}

/// Search approved listings.
#[utoipa::path(
    get,
    path = "/api/v1/services",
    params(ServiceSearchQuery),
    responses(
        (status = 200, description = "Listings", body = ServicePage),
        (status = 400, description = "Invalid filter or cursor", body = Error)
    ),
    tags = ["services"],
    operation_id = "searchServices",
    security([])
)]
#[get("/services")]
pub async fn search_services(
    req: HttpRequest,
    state: web::Data<HttpState>,
    query: web::Query<ServiceSearchQuery>,
) -> ApiResult<web::Json<ServicePage>> {
    let query = query.into_inner();
    let filter = ServiceFilter::new(
        query.category.as_deref(),
        query.q.as_deref(),
        query.min_price,
        query.max_price,
    )
    .map_err(catalogue_error)?;
    let limit = PageLimit::new(query.limit).map_err(pagination_error("limit"))?;
    let cursor = query
        .cursor
        .as_deref()
        .map(Cursor::<ServiceCursorKey>::decode)
        .transpose()
        .map_err(pagination_error("cursor"))?;
    let page = state.catalogue.search(&filter, cursor, limit).await?;
    let next = page
        .next_cursor
        .as_deref()
        .map(|token| next_page_url(&req.full_url(), token, limit).to_string());
    Ok(web::Json(ServicePage {
        data: page.data,
        next_cursor: page.next_cursor,
        next,
    }))
}

/// Submit a listing for review.
#[utoipa::path(
    post,
    path = "/api/v1/services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Listing pending approval", body = Service),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller is not a provider", body = Error)
    ),
    tags = ["services"],
    operation_id = "createService"
)]
#[post("/services")]
pub async fn create_service(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    payload: web::Json<CreateServiceRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let draft = ServiceDraft::new(ServiceDraftInput {
        title_en: &body.title.en,
        title_ar: body.title.ar.as_deref(),
        description_en: &body.description.en,
        description_ar: body.description.ar.as_deref(),
        category: &body.category,
        price_minor: body.price_minor,
        currency: body.currency.as_deref().unwrap_or(&state.default_currency),
        duration_minutes: body.duration_minutes,
    })
    .map_err(catalogue_error)?;
    let service = state.catalogue.create(principal, draft).await?;
    Ok(HttpResponse::Created().json(service))
}

/// Fetch a listing. Unapproved listings are visible to their owner and admins.
#[utoipa::path(
    get,
    path = "/api/v1/services/{id}",
    params(("id" = String, Path, description = "Service id")),
    responses(
        (status = 200, description = "Listing", body = Service),
        (status = 400, description = "Invalid id", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["services"],
    operation_id = "getService",
    security([])
)]
#[get("/services/{id}")]
pub async fn get_service(
    state: web::Data<HttpState>,
    MaybeAuthenticated(principal): MaybeAuthenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Service>> {
    let id: ServiceId = parse_id(&path, SERVICE_ID)?;
    state.catalogue.get(principal, id).await.map(web::Json)
}

/// Edit an owned listing; it returns to review.
#[utoipa::path(
    patch,
    path = "/api/v1/services/{id}",
    params(("id" = String, Path, description = "Service id")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Updated listing", body = Service),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Listing archived", body = Error)
    ),
    tags = ["services"],
    operation_id = "updateService"
)]
#[patch("/services/{id}")]
pub async fn update_service(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    path: web::Path<String>,
    payload: web::Json<UpdateServiceRequest>,
) -> ApiResult<web::Json<Service>> {
    let id: ServiceId = parse_id(&path, SERVICE_ID)?;
    let body = payload.into_inner();
    let update = ServiceUpdate::new(
        body.title.as_ref().map(LocalizedInput::as_pair),
        body.description.as_ref().map(LocalizedInput::as_pair),
        body.category.as_deref(),
        body.price_minor,
        body.duration_minutes,
    )
    .map_err(catalogue_error)?;
    state
        .catalogue
        .update(principal, id, update)
        .await
        .map(web::Json)
}

/// Archive a listing (owner or admin).
#[utoipa::path(
    delete,
    path = "/api/v1/services/{id}",
    params(("id" = String, Path, description = "Service id")),
    responses(
        (status = 200, description = "Archived listing", body = Service),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["services"],
    operation_id = "archiveService"
)]
#[delete("/services/{id}")]
pub async fn archive_service(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Service>> {
    let id: ServiceId = parse_id(&path, SERVICE_ID)?;
    state.catalogue.archive(principal, id).await.map(web::Json)
}

/// Reviews of a listing with the rating summary.
#[utoipa::path(
    get,
    path = "/api/v1/services/{id}/reviews",
    params(("id" = String, Path, description = "Service id")),
    responses(
        (status = 200, description = "Reviews", body = ServiceReviews),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["services", "reviews"],
    operation_id = "serviceReviews",
    security([])
)]
#[get("/services/{id}/reviews")]
pub async fn service_reviews(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<ServiceReviews>> {
    let id: ServiceId = parse_id(&path, SERVICE_ID)?;
    state.reviews.service_reviews(id).await.map(web::Json)
}

/// The calling provider's listings in every status.
#[utoipa::path(
    get,
    path = "/api/v1/providers/me/services",
    responses(
        (status = 200, description = "Own listings", body = [Service]),
        (status = 403, description = "Caller is not a provider", body = Error)
    ),
    tags = ["services"],
    operation_id = "providerServices"
)]
#[get("/providers/me/services")]
pub async fn provider_services(
    state: web::Data<HttpState>,
    Authenticated(principal): Authenticated,
) -> ApiResult<web::Json<Vec<Service>>> {
    state
        .catalogue
        .provider_services(principal)
        .await
        .map(web::Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::domain::ports::ServiceRepository;
    use crate::inbound::http::test_utils::{TestHarness, bearer};
    use crate::test_support::sample_service;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::{Value, json};

    macro_rules! app {
        ($harness:expr) => {
            actix_test::init_service(
                App::new()
                    .app_data(web::Data::new($harness.state.clone()))
                    .service(
                        web::scope("/api/v1")
                            .service(search_services)
                            .service(create_service)
                            .service(provider_services)
                            .service(service_reviews)
                            .service(get_service)
                            .service(update_service)
                            .service(archive_service),
                    ),
            )
            .await
        };
    }

    fn listing() -> Value {
        json!({
            "title": {"en": "Leak repair", "ar": "إصلاح التسريب"},
            "description": {"en": "Kitchen and bathroom leaks."},
            "category": "plumbing",
            "priceMinor": 15000,
            "durationMinutes": 60
        })
    }

    #[rstest]
    #[actix_web::test]
    async fn providers_create_pending_listings_in_the_default_currency() {
        let harness = TestHarness::new();
        let (_, token) = harness.seed_user(Role::Provider).await;
        let app = app!(harness);
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/services")
            .insert_header(bearer(&token))
            .set_json(listing())
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["status"], "pending_approval");
        assert_eq!(body["price"]["currency"], "SAR");
    }

    #[rstest]
    #[case(Role::Client, StatusCode::FORBIDDEN)]
    #[case(Role::Provider, StatusCode::BAD_REQUEST)]
    #[actix_web::test]
    async fn create_rejects_clients_and_negative_prices(
        #[case] role: Role,
        #[case] expected: StatusCode,
    ) {
        let harness = TestHarness::new();
        let (_, token) = harness.seed_user(role).await;
        let app = app!(harness);
        let mut body = listing();
        if role == Role::Provider {
            body["priceMinor"] = json!(-1);
        }
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/services")
            .insert_header(bearer(&token))
            .set_json(body)
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), expected);
    }

    #[rstest]
    #[actix_web::test]
    async fn search_pages_with_cursors() {
        let harness = TestHarness::new();
        let (provider, _) = harness.seed_user(Role::Provider).await;
        for offset in 0..3 {
            let mut service = sample_service(provider.id);
            service.created_at += chrono::TimeDelta::minutes(offset);
            ServiceRepository::insert(&harness.store, &service)
                .await
                .expect("seed service");
        }
        let app = app!(harness);

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/services?category=cleaning&limit=2")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let first: Value = actix_test::read_body_json(res).await;
        assert_eq!(first["data"].as_array().map(Vec::len), Some(2));
        let cursor = first["nextCursor"].as_str().expect("cursor").to_owned();
        assert!(first["next"].as_str().is_some_and(|url| url.contains("cursor=")));

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/services?category=cleaning&limit=2&cursor={cursor}"))
                .to_request(),
        )
        .await;
        let second: Value = actix_test::read_body_json(res).await;
        assert_eq!(second["data"].as_array().map(Vec::len), Some(1));
        assert!(second.get("nextCursor").is_none());
    }

    #[rstest]
    #[case("/api/v1/services?limit=0", "limit")]
    #[case("/api/v1/services?cursor=%%%", "cursor")]
    #[case("/api/v1/services?minPrice=500&maxPrice=100", "minPrice")]
    #[actix_web::test]
    async fn search_rejects_bad_parameters(#[case] uri: &str, #[case] field: &str) {
        let harness = TestHarness::new();
        let app = app!(harness);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri(uri).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], field);
    }

    #[rstest]
    #[actix_web::test]
    async fn pending_listings_are_hidden_from_strangers() {
        let harness = TestHarness::new();
        let (provider, owner_token) = harness.seed_user(Role::Provider).await;
        let mut service = sample_service(provider.id);
        service.status = crate::domain::ServiceStatus::PendingApproval;
        ServiceRepository::insert(&harness.store, &service)
            .await
            .expect("seed service");
        let app = app!(harness);
        let uri = format!("/api/v1/services/{}", service.id);

        let anonymous = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri(&uri).to_request(),
        )
        .await;
        assert_eq!(anonymous.status(), StatusCode::NOT_FOUND);

        let owner = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&uri)
                .insert_header(bearer(&owner_token))
                .to_request(),
        )
        .await;
        assert_eq!(owner.status(), StatusCode::OK);
    }

    #[rstest]
    #[actix_web::test]
    async fn malformed_ids_are_bad_requests() {
        let harness = TestHarness::new();
        let app = app!(harness);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/v1/services/not-a-uuid").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["code"], "invalid_uuid");
    }
}
