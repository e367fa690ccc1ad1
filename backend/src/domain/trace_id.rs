//! Correlation identifiers for requests.
//!
//! A [`TraceId`] lives in task-local storage for as long as a request is being
//! served, so [`Error`](super::Error) values and log lines can quote it without
//! threading it through every call. Mobile clients may send their own id in
//! the `trace-id` header to correlate retries; anything that is not a UUID is
//! replaced with a fresh one.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

/// Header used to accept and echo trace identifiers.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    static CURRENT: TraceId;
}

/// UUID identifying one request across logs and error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reuse a client-supplied identifier when it is a non-nil UUID.
    #[must_use]
    pub fn adopt_or_generate(supplied: Option<&str>) -> Self {
        supplied
            .and_then(|raw| raw.trim().parse::<Self>().ok())
            .filter(|id| !id.0.is_nil())
            .unwrap_or_else(Self::generate)
    }

    /// Identifier of the request being served on this task, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    /// Drive `fut` with `self` as the current identifier.
    ///
    /// Spawned tasks do not inherit the scope.
    pub async fn scope<Fut: Future>(self, fut: Fut) -> Fut::Output {
        CURRENT.scope(self, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(raw).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[tokio::test]
    async fn scope_exposes_identifier_to_nested_calls() {
        let id = TraceId::generate();
        let seen = id.scope(async { TraceId::current() }).await;
        assert_eq!(seen, Some(id));
        assert!(TraceId::current().is_none());
    }

    #[rstest]
    fn adopts_well_formed_client_ids() {
        let supplied = "6f1c2b7e-3d1a-4c55-9b0e-2a7d3f9e8c41";
        let id = TraceId::adopt_or_generate(Some(supplied));
        assert_eq!(id.to_string(), supplied);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("booking-42"))]
    #[case(Some("00000000-0000-0000-0000-000000000000"))]
    fn replaces_missing_or_unusable_ids(#[case] supplied: Option<&str>) {
        let id = TraceId::adopt_or_generate(supplied);
        assert_ne!(id.to_string(), supplied.unwrap_or_default());
        assert!(!id.0.is_nil());
    }
}
