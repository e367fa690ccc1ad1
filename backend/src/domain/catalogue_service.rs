//! Listing management and public search.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Cursor, PageLimit, Paginated};
use tracing::info;

use super::ports::ServiceRepository;
use super::service_support::map_repository_error;
use super::{
    Error, Principal, Role, Service, ServiceCursorKey, ServiceDraft, ServiceFilter, ServiceId,
    ServiceStatus, ServiceUpdate, UserId,
};

/// Listing use-cases.
#[derive(Clone)]
pub struct CatalogueService {
    services: Arc<dyn ServiceRepository>,
    clock: Arc<dyn Clock>,
}

impl CatalogueService {
    /// Wire the service to its ports.
    pub fn new(services: Arc<dyn ServiceRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { services, clock }
    }

    /// Publish a new listing for admin review.
    pub async fn create(&self, actor: Principal, draft: ServiceDraft) -> Result<Service, Error> {
        actor.require(Role::Provider)?;
        let now = self.clock.utc();
        let service = Service {
            id: ServiceId::random(),
            provider_id: actor.user_id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            price: draft.price,
            duration_minutes: draft.duration_minutes,
            status: ServiceStatus::PendingApproval,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.services
            .insert(&service)
            .await
            .map_err(map_repository_error)?;
        info!(service_id = %service.id, provider_id = %actor.user_id, "service submitted");
        Ok(service)
    }

    /// Edit an owned listing; edits always go back to review.
    pub async fn update(
        &self,
        actor: Principal,
        id: ServiceId,
        update: ServiceUpdate,
    ) -> Result<Service, Error> {
        if update.is_empty() {
            return Err(Error::invalid_request("no fields to update"));
        }
        let mut service = self.load(id).await?;
        if service.provider_id != actor.user_id {
            return Err(Error::forbidden("only the owner may edit this service"));
        }
        if service.status == ServiceStatus::Archived {
            return Err(Error::conflict("archived services cannot be edited"));
        }
        update.apply_to(&mut service);
        service.status = ServiceStatus::PendingApproval;
        service.rejection_reason = None;
        service.updated_at = self.clock.utc();
        self.services
            .update(&service)
            .await
            .map_err(map_repository_error)?;
        Ok(service)
    }

    /// Withdraw a listing. Archiving twice is a no-op.
    pub async fn archive(&self, actor: Principal, id: ServiceId) -> Result<Service, Error> {
        let mut service = self.load(id).await?;
        if service.provider_id != actor.user_id && !actor.is_admin() {
            return Err(Error::forbidden("only the owner or an admin may archive this service"));
        }
        if service.status == ServiceStatus::Archived {
            return Ok(service);
        }
        service.status = ServiceStatus::Archived;
        service.updated_at = self.clock.utc();
        self.services
            .update(&service)
            .await
            .map_err(map_repository_error)?;
        info!(service_id = %service.id, "service archived");
        Ok(service)
    }

    /// Fetch a listing as `viewer`. Hidden listings look missing.
    pub async fn get(&self, viewer: Option<Principal>, id: ServiceId) -> Result<Service, Error> {
        let service = self.load(id).await?;
        let viewer_id = viewer.map(|p| p.user_id);
        let is_admin = viewer.is_some_and(|p| p.is_admin());
        if service.visible_to(viewer_id, is_admin) {
            Ok(service)
        } else {
            Err(not_found(id))
        }
    }

    /// Approved listings only, for booking and assistant lookups.
    pub async fn get_approved(&self, id: ServiceId) -> Result<Service, Error> {
        let service = self.load(id).await?;
        if service.status == ServiceStatus::Approved {
            Ok(service)
        } else {
            Err(not_found(id))
        }
    }

    /// Search approved listings, newest first.
    pub async fn search(
        &self,
        filter: &ServiceFilter,
        cursor: Option<Cursor<ServiceCursorKey>>,
        limit: PageLimit,
    ) -> Result<Paginated<Service>, Error> {
        let rows = self
            .services
            .search(filter, cursor.map(Cursor::into_key), limit.lookahead())
            .await
            .map_err(map_repository_error)?;
        Paginated::from_lookahead(rows, limit, ServiceCursorKey::of)
            .map_err(|err| Error::internal(format!("cursor encoding failed: {err}")))
    }

    /// A provider's own listings in every status.
    pub async fn provider_services(&self, actor: Principal) -> Result<Vec<Service>, Error> {
        actor.require(Role::Provider)?;
        self.services
            .list_by_provider(actor.user_id)
            .await
            .map_err(map_repository_error)
    }

    /// Listings waiting for review, oldest first.
    pub(crate) async fn pending(&self) -> Result<Vec<Service>, Error> {
        self.services
            .list_by_status(ServiceStatus::PendingApproval)
            .await
            .map_err(map_repository_error)
    }

    /// Record an admin verdict on a pending listing.
    pub(crate) async fn decide(
        &self,
        id: ServiceId,
        rejection: Option<String>,
    ) -> Result<Service, Error> {
        let mut service = self.load(id).await?;
        if service.status != ServiceStatus::PendingApproval {
            return Err(Error::conflict("only services awaiting approval can be decided"));
        }
        service.status = if rejection.is_some() {
            ServiceStatus::Rejected
        } else {
            ServiceStatus::Approved
        };
        service.rejection_reason = rejection;
        service.updated_at = self.clock.utc();
        self.services
            .update(&service)
            .await
            .map_err(map_repository_error)?;
        Ok(service)
    }

    /// Number of listings per status.
    pub(crate) async fn count_by_status(&self) -> Result<Vec<(ServiceStatus, u64)>, Error> {
        self.services
            .count_by_status()
            .await
            .map_err(map_repository_error)
    }

    /// Provider of a listing regardless of status.
    pub(crate) async fn owner_of(&self, id: ServiceId) -> Result<UserId, Error> {
        Ok(self.load(id).await?.provider_id)
    }

    async fn load(&self, id: ServiceId) -> Result<Service, Error> {
        self.services
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: ServiceId) -> Error {
    Error::not_found(format!("service {id} not found"))
}
