//! Cross-cutting actix middleware.
//!
//! Wrap order matters: [`Trace`] goes outermost so rate-limit rejections
//! still carry a trace id.

pub mod rate_limit;
pub mod trace;

pub use rate_limit::{Budget, RateLimit, RateLimitConfig, RateLimiter};
pub use trace::Trace;
