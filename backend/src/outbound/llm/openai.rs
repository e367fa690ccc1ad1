//! OpenAI Chat Completions adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::transport;
use crate::domain::ports::{ChatPrompt, LanguageModel, LanguageModelError};

const DEFAULT_BASE: &str = "https://api.openai.com";

/// Calls `POST /v1/chat/completions`.
pub struct OpenAiChat {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiChat {
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
            endpoint: transport::endpoint(base_url, DEFAULT_BASE, "/v1/chat/completions"),
            model,
            api_key,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn request_body<'a>(model: &'a str, prompt: &'a ChatPrompt) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: [
            Message {
                role: "system",
                content: &prompt.system,
            },
            Message {
                role: "user",
                content: &prompt.user,
            },
        ],
        temperature: 0.3,
    }
}

fn reply_text(response: ChatResponse) -> Result<String, LanguageModelError> {
    transport::non_empty(
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content),
    )
}

#[async_trait]
impl LanguageModel for OpenAiChat {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, LanguageModelError> {
        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body(&self.model, prompt));
        reply_text(transport::send_json(request).await?)
    }

    fn provider(&self) -> &'static str {
        "openai"
    }
}
