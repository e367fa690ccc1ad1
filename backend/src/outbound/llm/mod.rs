//! Chat completion adapters for the assistant.
//!
//! Each provider owns its wire format; [`transport`] owns the shared
//! timeout, status mapping and body previews. Nothing here retries.

mod anthropic;
mod gemini;
mod ollama;
mod openai;
mod transport;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::ports::{DisabledLanguageModel, LanguageModel};

pub use anthropic::AnthropicChat;
pub use gemini::GeminiChat;
pub use ollama::OllamaChat;
pub use openai::OpenAiChat;

/// Supported chat completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Gemini,
    Anthropic,
    Ollama,
}

impl LlmProvider {
    /// Model used when none is configured.
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Gemini => "gemini-1.5-flash",
            Self::Anthropic => "claude-3-5-haiku-latest",
            Self::Ollama => "llama3.1",
        }
    }

    const fn needs_api_key(self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!("unknown llm provider: {other}")),
        }
    }
}

/// Resolved language model configuration.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: Option<LlmProvider>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// Overrides the provider's public endpoint root.
    pub base_url: Option<String>,
    pub timeout: Duration,
}

/// Build the configured model, or [`DisabledLanguageModel`] when the
/// configuration is incomplete.
///
/// # Errors
///
/// Returns an error when the reqwest client cannot be constructed.
pub fn build_language_model(
    settings: &LlmSettings,
) -> Result<Arc<dyn LanguageModel>, reqwest::Error> {
    let Some(provider) = settings.provider else {
        info!("no llm provider configured; assistant uses templates only");
        return Ok(Arc::new(DisabledLanguageModel));
    };
    let api_key = settings
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty());
    if provider.needs_api_key() && api_key.is_none() {
        warn!(?provider, "llm provider configured without an api key; disabling");
        return Ok(Arc::new(DisabledLanguageModel));
    }
    let model = settings
        .model
        .clone()
        .unwrap_or_else(|| provider.default_model().to_owned());
    let base_url = settings.base_url.as_deref();
    let key = api_key.unwrap_or_default();

    let adapter: Arc<dyn LanguageModel> = match provider {
        LlmProvider::OpenAi => Arc::new(OpenAiChat::new(base_url, model, key, settings.timeout)?),
        LlmProvider::Gemini => Arc::new(GeminiChat::new(base_url, model, key, settings.timeout)?),
        LlmProvider::Anthropic => {
            Arc::new(AnthropicChat::new(base_url, model, key, settings.timeout)?)
        }
        LlmProvider::Ollama => Arc::new(OllamaChat::new(base_url, model, settings.timeout)?),
    };
    info!(provider = adapter.provider(), "llm provider configured");
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn settings(provider: Option<LlmProvider>, api_key: Option<&str>) -> LlmSettings {
        LlmSettings {
            provider,
            model: None,
            api_key: api_key.map(str::to_owned),
            base_url: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[rstest]
    #[case("OpenAI", Some(LlmProvider::OpenAi))]
    #[case(" gemini ", Some(LlmProvider::Gemini))]
    #[case("anthropic", Some(LlmProvider::Anthropic))]
    #[case("ollama", Some(LlmProvider::Ollama))]
    #[case("mistral", None)]
    fn parses_provider_names(#[case] raw: &str, #[case] expected: Option<LlmProvider>) {
        assert_eq!(raw.parse::<LlmProvider>().ok(), expected);
    }

    #[rstest]
    #[case(None, None, "disabled")]
    #[case(Some(LlmProvider::OpenAi), None, "disabled")]
    #[case(Some(LlmProvider::Anthropic), Some("  "), "disabled")]
    #[case(Some(LlmProvider::OpenAi), Some("sk-test"), "openai")]
    #[case(Some(LlmProvider::Gemini), Some("g-key"), "gemini")]
    #[case(Some(LlmProvider::Anthropic), Some("a-key"), "anthropic")]
    #[case(Some(LlmProvider::Ollama), None, "ollama")]
    fn builds_the_configured_adapter(
        #[case] provider: Option<LlmProvider>,
        #[case] api_key: Option<&str>,
        #[case] expected: &str,
    ) {
        let model = build_language_model(&settings(provider, api_key)).expect("client builds");
        assert_eq!(model.provider(), expected);
    }
}
