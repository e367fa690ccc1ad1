//! Khidma backend library: a bilingual (English/Arabic) marketplace for
//! home and professional services.
//!
//! - [`domain`]: entities, validation and use-case services behind ports
//! - [`inbound`]: REST handlers and the live notification socket
//! - [`outbound`]: Diesel, in-memory, Stripe, LLM and security adapters
//! - [`middleware`]: request tracing and rate limiting
//! - [`settings`]: OrthoConfig server settings

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(test)]
pub(crate) mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
