//! Origin allow-list for WebSocket upgrades.
//!
//! Entries are exact origins (`https://app.khidma.example`,
//! `http://localhost:5173`) or a wildcard subdomain (`https://*.khidma.example`)
//! which matches subdomains but not the bare domain.

use actix_web::http::header::HeaderValue;
use tracing::{error, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    Exact(url::Origin),
    Subdomain { scheme: String, suffix: String },
}

/// Parsed allow-list. An empty list rejects every browser origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedOrigins {
    rules: Vec<Rule>,
}

/// Allow-list entry that is not an origin.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid allowed origin `{entry}`")]
pub struct InvalidOrigin {
    pub entry: String,
}

impl AllowedOrigins {
    /// Parse allow-list entries; blank entries are skipped.
    pub fn parse<I, S>(entries: I) -> Result<Self, InvalidOrigin>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            let invalid = || InvalidOrigin {
                entry: entry.to_owned(),
            };
            if let Some((scheme, host)) = entry.split_once("://*.") {
                if host.is_empty() || host.contains('/') {
                    return Err(invalid());
                }
                rules.push(Rule::Subdomain {
                    scheme: scheme.to_ascii_lowercase(),
                    suffix: format!(".{}", host.to_ascii_lowercase()),
                });
                continue;
            }
            let url = Url::parse(entry).map_err(|_| invalid())?;
            if url.host_str().is_none() {
                return Err(invalid());
            }
            rules.push(Rule::Exact(url.origin()));
        }
        Ok(Self { rules })
    }

    /// Whether a parsed `Origin` header matches any rule.
    pub fn allows(&self, origin: &Url) -> bool {
        let Some(host) = origin.host_str() else {
            return false;
        };
        let candidate = origin.origin();
        self.rules.iter().any(|rule| match rule {
            Rule::Exact(allowed) => *allowed == candidate,
            Rule::Subdomain { scheme, suffix } => {
                origin.scheme() == scheme
                    && host.len() > suffix.len()
                    && host.ends_with(suffix.as_str())
            }
        })
    }

    /// Validate the raw `Origin` header of an upgrade request.
    pub fn validate(&self, header: &HeaderValue) -> actix_web::Result<()> {
        let value = header.to_str().map_err(|err| {
            error!(error = %err, "Origin header is not valid ASCII");
            actix_web::error::ErrorBadRequest("Invalid Origin header")
        })?;
        let origin = Url::parse(value).map_err(|err| {
            error!(error = %err, "Origin header is not a URL");
            actix_web::error::ErrorBadRequest("Invalid Origin header")
        })?;
        if self.allows(&origin) {
            Ok(())
        } else {
            warn!(origin = value, "rejected WebSocket upgrade from disallowed origin");
            Err(actix_web::error::ErrorForbidden("Origin not allowed"))
        }
    }
}
