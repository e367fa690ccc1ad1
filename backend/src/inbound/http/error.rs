//! Rendering of domain [`Error`] values as HTTP responses.
//!
//! Every failure leaves the server as the same JSON envelope. Internal errors
//! are logged in full and replaced with a generic message on the wire; the
//! trace id survives so support can find the log line. Rate-limit rejections
//! also get a `Retry-After` header.

use actix_web::http::StatusCode;
use actix_web::http::header::RETRY_AFTER;
use actix_web::{HttpResponse, HttpResponseBuilder, ResponseError};
use tracing::{error, warn};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

pub use crate::domain::ApiResult;

/// Details key carrying the seconds until a rate-limited caller may retry.
pub const RETRY_AFTER_DETAIL: &str = "retryAfterSecs";

const REDACTED: &str = "Internal server error";

/// HTTP status for each stable error code.
pub const fn http_status(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The body actually sent to clients.
fn wire_body(error: &Error) -> Error {
    if error.code() != ErrorCode::InternalError {
        return error.clone();
    }
    let generic = Error::internal(REDACTED);
    match error.trace_id() {
        Some(id) => generic.with_trace_id(id),
        None => generic,
    }
}

fn add_headers(builder: &mut HttpResponseBuilder, error: &Error) {
    if let Some(id) = error.trace_id() {
        builder.insert_header((TRACE_ID_HEADER, id));
    }
    let wait = error
        .details()
        .and_then(|details| details.get(RETRY_AFTER_DETAIL))
        .and_then(serde_json::Value::as_u64);
    if let Some(seconds) = wait {
        builder.insert_header((RETRY_AFTER, seconds.to_string()));
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        http_status(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        match self.code() {
            ErrorCode::InternalError => {
                error!(trace_id = self.trace_id(), detail = self.message(), "request failed");
            }
            ErrorCode::ServiceUnavailable => {
                warn!(trace_id = self.trace_id(), detail = self.message(), "dependency unavailable");
            }
            _ => {}
        }
        let mut builder = HttpResponse::build(self.status_code());
        add_headers(&mut builder, self);
        builder.json(wire_body(self))
    }
}

/// Framework errors keep client-side statuses as `invalid_request`; anything
/// else becomes a redacted internal error.
impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        let status = err.as_response_error().status_code();
        if status.is_client_error() {
            Error::invalid_request(err.to_string())
        } else {
            error!(error = %err, %status, "framework error");
            Error::internal(REDACTED)
        }
    }
}
