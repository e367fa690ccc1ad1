//! Request correlation and access logging.
//!
//! [`Trace`] scopes a [`TraceId`] around each request, echoes it in the
//! `trace-id` response header and logs one `request completed` line with the
//! status and latency. Health checks are logged at `debug` so orchestrator
//! polling does not drown the access log.

use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, debug, field, info, info_span, warn};

use crate::domain::{TRACE_ID_HEADER, TraceId};

const HEALTH_PREFIX: &str = "/health/";

/// Middleware factory; wrap it outermost so every other layer runs in scope.
///
/// ```
/// use actix_web::App;
/// use khidma::Trace;
///
/// let _app = App::new().wrap(Trace);
/// ```
#[derive(Clone, Copy, Default)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, inner: S) -> Self::Future {
        ready(Ok(TraceService { inner }))
    }
}

#[doc(hidden)]
pub struct TraceService<S> {
    inner: S,
}

impl<S, B> Service<ServiceRequest> for TraceService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let supplied = req
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok());
        let trace_id = TraceId::adopt_or_generate(supplied);
        let health_check = req.path().starts_with(HEALTH_PREFIX);
        let span = info_span!(
            "http_request",
            method = %req.method(),
            path = %req.path(),
            trace_id = %trace_id,
            status = field::Empty,
        );
        let started = Instant::now();
        let pending = self.inner.call(req);
        let recorder = span.clone();

        Box::pin(
            trace_id
                .scope(async move {
                    let mut response = pending.await?;
                    let status = response.status();
                    recorder.record("status", status.as_u16());
                    stamp_header(&mut response, trace_id);
                    let elapsed_ms = started.elapsed().as_millis();
                    if health_check {
                        debug!(elapsed_ms, "request completed");
                    } else if status.is_server_error() {
                        warn!(elapsed_ms, "request completed with server error");
                    } else {
                        info!(elapsed_ms, "request completed");
                    }
                    Ok(response)
                })
                .instrument(span),
        )
    }
}

fn stamp_header<B>(response: &mut ServiceResponse<B>, trace_id: TraceId) {
    match HeaderValue::from_str(&trace_id.to_string()) {
        Ok(value) => {
            response
                .headers_mut()
                .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
        }
        Err(error) => warn!(%error, "trace id is not a valid header value"),
    }
}
