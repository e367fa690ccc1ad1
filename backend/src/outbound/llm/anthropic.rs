//! Anthropic Messages API adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::transport;
use crate::domain::ports::{ChatPrompt, LanguageModel, LanguageModelError};

const DEFAULT_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 512;

/// Calls `POST /v1/messages`.
pub struct AnthropicChat {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl AnthropicChat {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Option<&str>,
        model: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: transport::client(timeout)?,
            endpoint: transport::endpoint(base_url, DEFAULT_BASE, "/v1/messages"),
            model,
            api_key,
        })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

fn request_body<'a>(model: &'a str, prompt: &'a ChatPrompt) -> MessagesRequest<'a> {
    MessagesRequest {
        model,
        max_tokens: MAX_TOKENS,
        system: &prompt.system,
        messages: [Message {
            role: "user",
            content: &prompt.user,
        }],
    }
}

fn reply_text(response: MessagesResponse) -> Result<String, LanguageModelError> {
    let text = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");
    transport::non_empty(Some(text))
}

#[async_trait]
impl LanguageModel for AnthropicChat {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, LanguageModelError> {
        let request = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request_body(&self.model, prompt));
        reply_text(transport::send_json(request).await?)
    }

    fn provider(&self) -> &'static str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn system_prompt_is_a_top_level_field() {
        let prompt = ChatPrompt {
            system: "Answer briefly.".to_owned(),
            user: "مرحبا".to_owned(),
        };
        let body = serde_json::to_value(request_body("claude", &prompt)).expect("json");
        assert_eq!(body["system"], "Answer briefly.");
        assert_eq!(body["max_tokens"], MAX_TOKENS);
        assert_eq!(body["messages"], json!([{"role": "user", "content": "مرحبا"}]));
    }

    #[test]
    fn text_blocks_are_concatenated() {
        let response: MessagesResponse = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "Book a "},
                {"type": "tool_use", "id": "t1"},
                {"type": "text", "text": "cleaner."}
            ]
        }))
        .expect("decodes");
        assert_eq!(reply_text(response), Ok("Book a cleaner.".to_owned()));
    }
}
