//! Google Gemini `generateContent` adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::transport;
use crate::domain::ports::{ChatPrompt, LanguageModel, LanguageModelError};

const DEFAULT_BASE: &str = "https://generativelanguage.googleapis.com";

/// Calls `POST /v1beta/models/{model}:generateContent`.
pub struct GeminiChat {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiChat {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Option<&str>,
        model: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let path = format!("/v1beta/models/{model}:generateContent");
        Ok(Self {
            client: transport::client(timeout)?,
            endpoint: transport::endpoint(base_url, DEFAULT_BASE, &path),
            api_key,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn request_body(prompt: &ChatPrompt) -> GenerateRequest<'_> {
    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: [Part {
                text: &prompt.system,
            }],
        },
        contents: [Content {
            role: Some("user"),
            parts: [Part { text: &prompt.user }],
        }],
    }
}

fn reply_text(response: GenerateResponse) -> Result<String, LanguageModelError> {
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        });
    transport::non_empty(text)
}

#[async_trait]
impl LanguageModel for GeminiChat {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, LanguageModelError> {
        let request = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(prompt));
        reply_text(transport::send_json(request).await?)
    }

    fn provider(&self) -> &'static str {
        "gemini"
    }
}
