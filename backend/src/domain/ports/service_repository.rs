//! Port abstraction for service listing persistence.

use async_trait::async_trait;

use crate::domain::{Service, ServiceCursorKey, ServiceFilter, ServiceId, ServiceStatus, UserId};

use super::RepositoryError;

/// Listing storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceRepository: Send + Sync {
    /// Insert a new listing.
    async fn insert(&self, service: &Service) -> Result<(), RepositoryError>;

    /// Replace an existing listing.
    async fn update(&self, service: &Service) -> Result<(), RepositoryError>;

    /// Fetch a listing in any status.
    async fn find_by_id(&self, id: ServiceId) -> Result<Option<Service>, RepositoryError>;

    /// Approved listings matching `filter`, newest first, strictly after
    /// `after`, at most `limit` rows.
    async fn search(
        &self,
        filter: &ServiceFilter,
        after: Option<ServiceCursorKey>,
        limit: usize,
    ) -> Result<Vec<Service>, RepositoryError>;

    /// A provider's listings in any status, newest first.
    async fn list_by_provider(&self, provider: UserId) -> Result<Vec<Service>, RepositoryError>;

    /// Listings in `status`, oldest first.
    async fn list_by_status(&self, status: ServiceStatus) -> Result<Vec<Service>, RepositoryError>;

    /// Number of listings per status.
    async fn count_by_status(&self) -> Result<Vec<(ServiceStatus, u64)>, RepositoryError>;
}
