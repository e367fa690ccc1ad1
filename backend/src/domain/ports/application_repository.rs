//! Port abstraction for provider application persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    ApplicationId, ApplicationStatus, Decision, ProviderApplication, UserId,
};

use super::RepositoryError;

/// Provider application storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Insert an application. Yields [`RepositoryError::Conflict`] when the
    /// user already has a pending one.
    async fn insert(&self, application: &ProviderApplication) -> Result<(), RepositoryError>;

    /// Fetch an application.
    async fn find_by_id(
        &self,
        id: ApplicationId,
    ) -> Result<Option<ProviderApplication>, RepositoryError>;

    /// Most recent application of `user`.
    async fn latest_for_user(
        &self,
        user: UserId,
    ) -> Result<Option<ProviderApplication>, RepositoryError>;

    /// Applications, optionally by status, oldest first.
    async fn list(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ProviderApplication>, RepositoryError>;

    /// Record an admin decision on a pending application in one atomic step.
    /// Approval also promotes the applicant to provider. Yields
    /// [`RepositoryError::Missing`] for unknown ids and
    /// [`RepositoryError::Conflict`] when the application is not pending.
    async fn decide(
        &self,
        id: ApplicationId,
        decision: &Decision,
        reviewer: UserId,
        at: DateTime<Utc>,
    ) -> Result<ProviderApplication, RepositoryError>;
}
