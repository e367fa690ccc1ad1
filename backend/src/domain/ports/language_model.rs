//! Port abstraction for chat completion providers.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Language model provider failures.
    pub enum LanguageModelError {
        /// No provider configured.
        Unconfigured => "language model is not configured",
        /// Provider unreachable or timed out.
        Transport { message: String } => transient "language model request failed: {message}",
        /// Provider returned an error status.
        Status { status: u16, message: String } => "language model returned {status}: {message}",
        /// Response had no usable text.
        EmptyResponse => "language model returned no text",
    }
}

/// Single-turn chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    /// Instructions constraining the model.
    pub system: String,
    /// Guard-railed user message.
    pub user: String,
}

/// Chat completion backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Produce a reply to `prompt`.
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, LanguageModelError>;

    /// Provider label for logs.
    fn provider(&self) -> &'static str;
}

/// Stand-in used when no provider is configured; always fails so callers
/// fall back to templates.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledLanguageModel;

#[async_trait]
impl LanguageModel for DisabledLanguageModel {
    async fn complete(&self, _prompt: &ChatPrompt) -> Result<String, LanguageModelError> {
        Err(LanguageModelError::unconfigured())
    }

    fn provider(&self) -> &'static str {
        "disabled"
    }
}
