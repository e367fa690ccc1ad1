//! Fixed-window request budgets per client IP.
//!
//! Two budgets apply: a stricter one for credential and assistant endpoints
//! and a general one for everything else. Counters live in process memory
//! and reset when their window elapses.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error;
use dashmap::DashMap;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use serde_json::json;
use tracing::debug;

use crate::domain::Error as DomainError;
use crate::inbound::http::error::RETRY_AFTER_DETAIL;

/// Path prefixes that draw on the strict budget.
pub const STRICT_PREFIXES: [&str; 2] = ["/api/v1/auth/", "/api/v1/assistant/"];

/// Counters are swept once the map holds this many keys.
const SWEEP_THRESHOLD: usize = 10_000;

/// Requests allowed per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    /// Requests admitted before the window resets.
    pub max_requests: u32,
    /// Length of one counting window.
    pub window: Duration,
}

impl Budget {
    /// `max_requests` per sixty-second window.
    pub const fn per_minute(max_requests: u32) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(60),
        }
    }
}

/// General and strict budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Budget for ordinary routes.
    pub general: Budget,
    /// Budget for routes under [`STRICT_PREFIXES`].
    pub strict: Budget,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general: Budget::per_minute(120),
            strict: Budget::per_minute(20),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Tier {
    General,
    Strict,
}

fn tier_for(path: &str) -> Tier {
    if STRICT_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        Tier::Strict
    } else {
        Tier::General
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Shared counter table.
#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<DashMap<(IpAddr, Tier), Window>>,
}

impl RateLimiter {
    /// Empty counter table enforcing `config`.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(DashMap::new()),
        }
    }

    fn budget(&self, tier: Tier) -> Budget {
        match tier {
            Tier::General => self.config.general,
            Tier::Strict => self.config.strict,
        }
    }

    /// Count one request from `ip` to `path` at `now`.
    ///
    /// Returns the seconds until the window resets when the budget is spent.
    pub fn check(&self, ip: IpAddr, path: &str, now: Instant) -> Result<(), u64> {
        let tier = tier_for(path);
        let budget = self.budget(tier);
        if self.windows.len() >= SWEEP_THRESHOLD {
            self.windows
                .retain(|_, window| now.duration_since(window.started) < self.budget_window());
        }

        let mut entry = self.windows.entry((ip, tier)).or_insert(Window {
            started: now,
            count: 0,
        });
        let window = entry.value_mut();
        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= budget.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }
        if window.count >= budget.max_requests {
            let remaining = budget.window.saturating_sub(elapsed);
            return Err(remaining.as_secs().max(1));
        }
        window.count += 1;
        Ok(())
    }

    fn budget_window(&self) -> Duration {
        self.config.general.window.max(self.config.strict.window)
    }
}

/// Actix middleware enforcing a [`RateLimiter`].
///
/// # Examples
/// ```
/// use actix_web::App;
/// use khidma::middleware::{RateLimit, RateLimitConfig};
///
/// let _app = App::new().wrap(RateLimit::new(RateLimitConfig::default()));
/// ```
#[derive(Clone)]
pub struct RateLimit {
    limiter: RateLimiter,
}

impl RateLimit {
    /// Middleware with its own counter table; clones share it.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            limiter: RateLimiter::new(config),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service,
            limiter: self.limiter.clone(),
        }))
    }
}

/// Service wrapper produced by [`RateLimit`].
pub struct RateLimitMiddleware<S> {
    service: S,
    limiter: RateLimiter,
}

fn client_ip(req: &ServiceRequest) -> IpAddr {
    req.peer_addr()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |addr| addr.ip())
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let ip = client_ip(&req);
        if let Err(retry_after) = self.limiter.check(ip, req.path(), Instant::now()) {
            debug!(%ip, path = req.path(), retry_after, "rate limit exceeded");
            let error = DomainError::rate_limited("Too many requests; slow down")
                .with_details(json!({ RETRY_AFTER_DETAIL: retry_after }));
            let response = req.error_response(error).map_into_right_body();
            return Box::pin(async move { Ok(response) });
        }
        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::http::header::RETRY_AFTER;
    use actix_web::{App, HttpResponse, test as actix_test, web};
    use rstest::{fixture, rstest};

    const CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7));

    #[fixture]
    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            general: Budget::per_minute(3),
            strict: Budget::per_minute(1),
        })
    }

    #[rstest]
    #[case("/api/v1/auth/login", Tier::Strict)]
    #[case("/api/v1/assistant/chat", Tier::Strict)]
    #[case("/api/v1/services", Tier::General)]
    #[case("/api/v1/authors", Tier::General)]
    fn strict_prefixes_select_the_strict_tier(#[case] path: &str, #[case] expected: Tier) {
        assert_eq!(tier_for(path), expected);
    }

    #[rstest]
    fn budget_is_enforced_per_window(limiter: RateLimiter) {
        let start = Instant::now();
        for _ in 0..3 {
            assert_eq!(limiter.check(CLIENT, "/api/v1/services", start), Ok(()));
        }
        let later = start + Duration::from_secs(20);
        assert_eq!(limiter.check(CLIENT, "/api/v1/services", later), Err(40));
        let next_window = start + Duration::from_secs(61);
        assert_eq!(limiter.check(CLIENT, "/api/v1/services", next_window), Ok(()));
    }

    #[rstest]
    fn tiers_and_clients_are_counted_separately(limiter: RateLimiter) {
        let now = Instant::now();
        let other = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 1));
        assert_eq!(limiter.check(CLIENT, "/api/v1/auth/login", now), Ok(()));
        assert!(limiter.check(CLIENT, "/api/v1/auth/register", now).is_err());
        assert_eq!(limiter.check(other, "/api/v1/auth/login", now), Ok(()));
        assert_eq!(limiter.check(CLIENT, "/api/v1/services", now), Ok(()));
    }

    #[actix_web::test]
    async fn exhausted_budget_returns_429_with_retry_after() {
        let app = actix_test::init_service(
            App::new()
                .wrap(RateLimit::new(RateLimitConfig {
                    general: Budget::per_minute(1),
                    strict: Budget::per_minute(1),
                }))
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let first = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/").to_request(),
        )
        .await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/").to_request(),
        )
        .await;
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key(RETRY_AFTER));
        let body: serde_json::Value = actix_test::read_body_json(second).await;
        assert_eq!(body["code"], "rate_limited");
    }
}
