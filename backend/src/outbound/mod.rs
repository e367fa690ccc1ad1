//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **memory**: lock-guarded in-process repositories for development and tests
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **security**: Argon2 password hashing and JWT bearer tokens
//! - **payments**: Stripe Checkout, Stripe webhooks and simulated Apple Pay
//! - **llm**: chat completion providers for the assistant
//! - **notifications**: broadcast hub feeding WebSocket sessions
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod llm;
pub mod memory;
pub mod notifications;
pub mod payments;
pub mod persistence;
pub mod security;
