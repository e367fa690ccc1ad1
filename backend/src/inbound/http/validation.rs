//! Shared validation helpers for inbound HTTP adapters.

use std::str::FromStr;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{HttpRequest, web};
use serde_json::json;

use crate::domain::{Error, IdParseError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidValue,
    MalformedBody,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::MalformedBody => "malformed_body",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("{field} must be a valid UUID")).with_details(json!({
        "field": field,
        "value": value,
        "code": ErrorCode::InvalidUuid.as_str(),
    }))
}

/// Parse a path or body identifier, reporting the offending field.
pub(crate) fn parse_id<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr<Err = IdParseError>,
{
    value
        .parse::<T>()
        .map_err(|_| invalid_uuid_error(field, value))
}

/// Parse an enum-like query value such as a status filter.
pub(crate) fn parse_value<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({
            "field": field.as_str(),
            "value": value,
            "code": ErrorCode::InvalidValue.as_str(),
        }))
    })
}

fn malformed(message: String) -> Error {
    Error::invalid_request(message).with_details(json!({
        "code": ErrorCode::MalformedBody.as_str(),
    }))
}

/// JSON extractor configuration that reports failures in the shared error schema.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
            malformed(format!("invalid JSON body: {err}")).into()
        })
}

/// Query extractor configuration that reports failures in the shared error schema.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req: &HttpRequest| {
        Error::invalid_request(format!("invalid query string: {err}")).into()
    })
}

/// Path extractor configuration that reports failures in the shared error schema.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: PathError, _req: &HttpRequest| {
        Error::invalid_request(format!("invalid path: {err}")).into()
    })
}
