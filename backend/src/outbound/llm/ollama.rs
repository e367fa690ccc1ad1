//! Ollama `/api/chat` adapter for self-hosted models.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::transport;
use crate::domain::ports::{ChatPrompt, LanguageModel, LanguageModelError};

const DEFAULT_BASE: &str = "http://localhost:11434";

/// Calls a local Ollama daemon with streaming disabled.
pub struct OllamaChat {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaChat {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Option<&str>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: transport::client(timeout)?,
            endpoint: transport::endpoint(base_url, DEFAULT_BASE, "/api/chat"),
            model,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: [Message<'a>; 2],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn request_body<'a>(model: &'a str, prompt: &'a ChatPrompt) -> ChatRequest<'a> {
    ChatRequest {
        model,
        stream: false,
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
    }
}

#[async_trait]
impl LanguageModel for OllamaChat {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, LanguageModelError> {
        let request = self
            .client
            .post(&self.endpoint)
            .json(&request_body(&self.model, prompt));
        let response: ChatResponse = transport::send_json(request).await?;
        transport::non_empty(response.message.and_then(|message| message.content))
    }

    fn provider(&self) -> &'static str {
        "ollama"
    }
}
