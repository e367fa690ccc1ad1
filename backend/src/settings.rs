//! Server settings loaded via OrthoConfig.
//!
//! Every value can come from CLI flags, `KHIDMA_*` environment variables or a
//! configuration file. Optional values fall back to development defaults in
//! the accessors below.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::middleware::{Budget, RateLimitConfig};
use crate::outbound::llm::{LlmProvider, LlmSettings};
use crate::outbound::payments::{STRIPE_API_BASE, StripeCheckoutSettings};
use crate::outbound::security::DEFAULT_TOKEN_TTL_SECS;

const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8080);
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_CURRENCY: &str = "SAR";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STRIPE_TIMEOUT_SECS: u64 = 15;
const DEFAULT_RATE_WINDOW_SECS: u64 = 60;
const DEFAULT_WS_ORIGIN: &str = "http://localhost:5173";
const DEV_JWT_SECRET: &str = "khidma-development-secret-change-me";

/// Runtime configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "KHIDMA")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL URL. Without it the server keeps data in memory.
    pub database_url: Option<String>,
    pub pool_max_size: Option<u32>,
    /// File holding the session cookie master key.
    pub session_key_file: Option<PathBuf>,
    /// Allow a generated session key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub session_allow_ephemeral: bool,
    /// Drop the `Secure` cookie attribute for plain-HTTP local setups.
    #[ortho_config(default = false)]
    pub cookie_insecure: bool,
    /// HMAC secret for bearer tokens.
    pub jwt_secret: Option<String>,
    pub jwt_ttl_secs: Option<i64>,
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub stripe_success_url: Option<String>,
    pub stripe_cancel_url: Option<String>,
    pub stripe_api_base: Option<String>,
    /// ISO 4217 code used when a listing names none.
    pub currency: Option<String>,
    /// One of `openai`, `gemini`, `anthropic` or `ollama`.
    pub llm_provider: Option<String>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_timeout_secs: Option<u64>,
    /// Requests per window for ordinary routes.
    pub rate_limit_general: Option<u32>,
    /// Requests per window for authentication and assistant routes.
    pub rate_limit_strict: Option<u32>,
    pub rate_limit_window_secs: Option<u64>,
    /// Origins allowed to open the notification socket, comma-separated in
    /// the environment.
    #[serde(default)]
    pub ws_allowed_origins: Vec<String>,
    /// Administrator created at startup when no account has this email.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_display_name: Option<String>,
}

/// Settings that parse but cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// `llm_provider` names no supported backend.
    #[error("invalid llm provider: {0}")]
    LlmProvider(String),
    /// Card checkout cannot redirect the payer anywhere.
    #[error("stripe secret key is set without success and cancel urls")]
    StripeRedirects,
    /// The bootstrap admin would have no way to sign in.
    #[error("admin email is set without an admin password")]
    AdminPassword,
}

/// Bootstrap administrator credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminBootstrap {
    /// Sign-in email, trimmed.
    pub email: String,
    /// Plain-text password, hashed before storage.
    pub password: String,
    /// Display name; `Administrator` when unset.
    pub display_name: String,
}

impl ServerSettings {
    /// Listen address, `0.0.0.0:8080` by default.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Upper bound on pooled database connections.
    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_SIZE)
    }

    /// Path of the cookie master key.
    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    /// Whether the session cookie carries the `Secure` attribute.
    pub fn cookie_secure(&self) -> bool {
        !self.cookie_insecure
    }

    /// Token secret; debug builds fall back to a fixed development value.
    pub fn jwt_secret(&self) -> Option<String> {
        match self.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => Some(secret.to_owned()),
            _ if cfg!(debug_assertions) => Some(DEV_JWT_SECRET.to_owned()),
            _ => None,
        }
    }

    /// Bearer token and session cookie lifetime in seconds.
    pub fn jwt_ttl_secs(&self) -> i64 {
        self.jwt_ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS)
    }

    /// Default listing currency, upper-cased.
    pub fn currency(&self) -> String {
        self.currency
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map_or_else(|| DEFAULT_CURRENCY.to_owned(), str::to_ascii_uppercase)
    }

    /// Card checkout configuration, or `None` when Stripe is not set up.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::StripeRedirects`] when a secret key is given
    /// without both redirect URLs.
    pub fn stripe_checkout(&self) -> Result<Option<StripeCheckoutSettings>, SettingsError> {
        let Some(secret_key) = non_blank(self.stripe_secret_key.as_deref()) else {
            return Ok(None);
        };
        let (Some(success_url), Some(cancel_url)) = (
            non_blank(self.stripe_success_url.as_deref()),
            non_blank(self.stripe_cancel_url.as_deref()),
        ) else {
            return Err(SettingsError::StripeRedirects);
        };
        Ok(Some(StripeCheckoutSettings {
            secret_key,
            api_base: non_blank(self.stripe_api_base.as_deref())
                .unwrap_or_else(|| STRIPE_API_BASE.to_owned()),
            success_url,
            cancel_url,
            timeout: Duration::from_secs(DEFAULT_STRIPE_TIMEOUT_SECS),
        }))
    }

    /// Signing secret for Stripe webhooks; webhooks are refused without it.
    pub fn stripe_webhook_secret(&self) -> Option<String> {
        non_blank(self.stripe_webhook_secret.as_deref())
    }

    /// Language model configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::LlmProvider`] for an unknown provider name.
    pub fn llm(&self) -> Result<LlmSettings, SettingsError> {
        let provider = non_blank(self.llm_provider.as_deref())
            .map(|raw| LlmProvider::from_str(&raw))
            .transpose()
            .map_err(SettingsError::LlmProvider)?;
        Ok(LlmSettings {
            provider,
            model: non_blank(self.llm_model.as_deref()),
            api_key: non_blank(self.llm_api_key.as_deref()),
            base_url: non_blank(self.llm_base_url.as_deref()),
            timeout: Duration::from_secs(
                self.llm_timeout_secs.unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
            ),
        })
    }

    /// Request budgets; both tiers share one window length.
    pub fn rate_limits(&self) -> RateLimitConfig {
        let defaults = RateLimitConfig::default();
        let window = Duration::from_secs(
            self.rate_limit_window_secs
                .unwrap_or(DEFAULT_RATE_WINDOW_SECS),
        );
        RateLimitConfig {
            general: Budget {
                max_requests: self
                    .rate_limit_general
                    .unwrap_or(defaults.general.max_requests),
                window,
            },
            strict: Budget {
                max_requests: self
                    .rate_limit_strict
                    .unwrap_or(defaults.strict.max_requests),
                window,
            },
        }
    }

    /// Allowed socket origins; the Vite dev server when unset.
    pub fn ws_allowed_origins(&self) -> Vec<String> {
        let origins: Vec<String> = self
            .ws_allowed_origins
            .iter()
            .filter_map(|origin| non_blank(Some(origin)))
            .collect();
        if origins.is_empty() {
            vec![DEFAULT_WS_ORIGIN.to_owned()]
        } else {
            origins
        }
    }

    /// Administrator to create at startup, if configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::AdminPassword`] when only the email is set.
    pub fn admin(&self) -> Result<Option<AdminBootstrap>, SettingsError> {
        let Some(email) = non_blank(self.admin_email.as_deref()) else {
            return Ok(None);
        };
        let password = self
            .admin_password
            .clone()
            .filter(|password| !password.is_empty())
            .ok_or(SettingsError::AdminPassword)?;
        Ok(Some(AdminBootstrap {
            email,
            password,
            display_name: non_blank(self.admin_display_name.as_deref())
                .unwrap_or_else(|| "Administrator".to_owned()),
        }))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    //! Unit tests for server settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 11] = [
        "KHIDMA_BIND_ADDR",
        "KHIDMA_COOKIE_INSECURE",
        "KHIDMA_DATABASE_URL",
        "KHIDMA_CURRENCY",
        "KHIDMA_STRIPE_SECRET_KEY",
        "KHIDMA_STRIPE_SUCCESS_URL",
        "KHIDMA_STRIPE_CANCEL_URL",
        "KHIDMA_LLM_PROVIDER",
        "KHIDMA_RATE_LIMIT_STRICT",
        "KHIDMA_WS_ALLOWED_ORIGINS",
        "KHIDMA_ADMIN_EMAIL",
    ];

    fn load_with(overrides: &[(&str, &str)]) -> ServerSettings {
        let _guard = lock_env(VARS.map(|name| {
            let value = overrides
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned());
            (name, value)
        }));
        ServerSettings::load_from_iter([OsString::from("khidma")]).expect("config should load")
    }

    #[rstest]
    fn defaults_are_used_when_missing() {
        let settings = load_with(&[]);
        assert_eq!(settings.bind_addr(), DEFAULT_BIND_ADDR);
        assert!(settings.database_url.is_none());
        assert_eq!(settings.currency(), "SAR");
        assert!(settings.cookie_secure());
        assert!(settings.stripe_checkout().expect("valid").is_none());
        assert_eq!(settings.rate_limits(), RateLimitConfig::default());
        assert_eq!(settings.ws_allowed_origins(), vec!["http://localhost:5173"]);
        assert_eq!(settings.admin(), Ok(None));
        assert!(settings.llm().expect("llm").provider.is_none());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let settings = load_with(&[
            ("KHIDMA_BIND_ADDR", "127.0.0.1:9000"),
            ("KHIDMA_DATABASE_URL", "postgres://localhost/khidma"),
            ("KHIDMA_CURRENCY", "aed"),
            ("KHIDMA_LLM_PROVIDER", "gemini"),
            ("KHIDMA_RATE_LIMIT_STRICT", "5"),
            (
                "KHIDMA_WS_ALLOWED_ORIGINS",
                "https://app.khidma.example, https://*.khidma.example",
            ),
        ]);
        assert_eq!(settings.bind_addr().port(), 9000);
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://localhost/khidma")
        );
        assert_eq!(settings.currency(), "AED");
        assert_eq!(
            settings.llm().expect("llm").provider,
            Some(LlmProvider::Gemini)
        );
        assert_eq!(settings.rate_limits().strict.max_requests, 5);
        assert_eq!(
            settings.ws_allowed_origins(),
            vec!["https://app.khidma.example", "https://*.khidma.example"]
        );
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some("false"), false)]
    #[case(Some("true"), true)]
    fn secure_cookies_are_opt_out(#[case] raw: Option<&str>, #[case] expected: bool) {
        let overrides: Vec<(&str, &str)> =
            raw.map(|value| ("KHIDMA_COOKIE_INSECURE", value)).into_iter().collect();
        assert_eq!(load_with(&overrides).cookie_secure(), expected);
    }

    #[rstest]
    fn a_single_socket_origin_loads() {
        let settings = load_with(&[("KHIDMA_WS_ALLOWED_ORIGINS", "https://app.khidma.example")]);
        assert_eq!(settings.ws_allowed_origins(), vec!["https://app.khidma.example"]);
    }

    #[rstest]
    #[case::stripe_without_redirects(
        &[("KHIDMA_STRIPE_SECRET_KEY", "sk_test_1")],
        SettingsError::StripeRedirects
    )]
    #[case::admin_without_password(
        &[("KHIDMA_ADMIN_EMAIL", "admin@khidma.example")],
        SettingsError::AdminPassword
    )]
    #[case::unknown_provider(
        &[("KHIDMA_LLM_PROVIDER", "eliza")],
        SettingsError::LlmProvider("unknown llm provider: eliza".to_owned())
    )]
    fn incomplete_settings_are_rejected(
        #[case] overrides: &[(&str, &str)],
        #[case] expected: SettingsError,
    ) {
        let settings = load_with(overrides);
        let error = settings
            .stripe_checkout()
            .err()
            .or_else(|| settings.admin().err())
            .or_else(|| settings.llm().err())
            .expect("some setting is rejected");
        assert_eq!(error, expected);
    }

    #[rstest]
    fn stripe_settings_fill_the_api_base() {
        let settings = load_with(&[
            ("KHIDMA_STRIPE_SECRET_KEY", "sk_test_1"),
            ("KHIDMA_STRIPE_SUCCESS_URL", "https://khidma.example/paid"),
            ("KHIDMA_STRIPE_CANCEL_URL", "https://khidma.example/cancelled"),
        ]);
        let stripe = settings
            .stripe_checkout()
            .expect("valid")
            .expect("configured");
        assert_eq!(stripe.api_base, STRIPE_API_BASE);
        assert_eq!(stripe.secret_key, "sk_test_1");
    }
}
