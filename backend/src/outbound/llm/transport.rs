//! Shared reqwest plumbing for chat providers.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::domain::ports::LanguageModelError;

/// Reqwest client with a single overall request timeout.
pub(super) fn client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

/// Join a configured root with a provider path, tolerating trailing slashes.
pub(super) fn endpoint(base_url: Option<&str>, default_base: &str, path: &str) -> String {
    let base = base_url.unwrap_or(default_base).trim_end_matches('/');
    format!("{base}{path}")
}

/// Send `request` once and decode a successful JSON body.
pub(super) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<T, LanguageModelError> {
    let response = request.send().await.map_err(map_transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    serde_json::from_slice(body.as_ref()).map_err(|error| {
        LanguageModelError::transport(format!("invalid response payload: {error}"))
    })
}

/// Trim provider text, treating blank output as missing.
pub(super) fn non_empty(text: Option<String>) -> Result<String, LanguageModelError> {
    text.map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(LanguageModelError::empty_response)
}

fn map_transport_error(error: reqwest::Error) -> LanguageModelError {
    if error.is_timeout() {
        LanguageModelError::transport(format!("timed out: {error}"))
    } else {
        LanguageModelError::transport(error.to_string())
    }
}

pub(super) fn map_status_error(status: StatusCode, body: &[u8]) -> LanguageModelError {
    LanguageModelError::status(status.as_u16(), body_preview(body))
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
