//! Liveness and readiness checks.
//!
//! The server marks itself ready once storage is reachable and migrations
//! have run, and unhealthy when it starts draining so orchestrators stop
//! routing traffic before the listener closes.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;
use utoipa::ToSchema;

/// Health flags shared between the server bootstrap and the check handlers.
#[derive(Debug)]
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
        }
    }
}

impl HealthState {
    /// Live but not yet ready.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail liveness from now on; called at the start of a graceful shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
        self.ready.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

/// Health check response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    /// `ok` or `unavailable`.
    pub status: &'static str,
}

fn health_response(ok: bool) -> HttpResponse {
    let (mut builder, status) = if ok {
        (HttpResponse::Ok(), "ok")
    } else {
        (HttpResponse::ServiceUnavailable(), "unavailable")
    };
    builder
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(HealthStatus { status })
}

/// Readiness check: 200 once the server accepts traffic, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Ready for traffic", body = HealthStatus),
        (status = 503, description = "Starting up or draining", body = HealthStatus)
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    health_response(state.is_ready())
}

/// Liveness check: 200 until shutdown begins.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Process is alive", body = HealthStatus),
        (status = 503, description = "Shutting down", body = HealthStatus)
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    health_response(state.is_alive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;

    async fn check(state: web::Data<HealthState>, path: &str) -> (StatusCode, Value, String) {
        let app = actix_test::init_service(
            App::new().app_data(state).service(ready).service(live),
        )
        .await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri(path).to_request(),
        )
        .await;
        let status = res.status();
        let cache = res
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let body: Value = actix_test::read_body_json(res).await;
        (status, body, cache)
    }

    #[rstest]
    #[actix_web::test]
    async fn readiness_follows_startup() {
        let state = web::Data::new(HealthState::new());
        let (status, body, cache) = check(state.clone(), "/health/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unavailable");
        assert_eq!(cache, "no-store");

        state.mark_ready();
        let (status, body, _) = check(state, "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[rstest]
    #[actix_web::test]
    async fn draining_fails_both_checks() {
        let state = web::Data::new(HealthState::new());
        state.mark_ready();
        state.mark_unhealthy();

        let (live_status, _, _) = check(state.clone(), "/health/live").await;
        let (ready_status, _, _) = check(state, "/health/ready").await;
        assert_eq!(live_status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ready_status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
