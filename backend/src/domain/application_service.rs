//! Provider onboarding: applications and their admin review.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use super::ports::{ApplicationRepository, RepositoryError};
use super::service_support::map_repository_error;
use super::{
    ApplicationDraft, ApplicationId, ApplicationStatus, Decision, Error, NotificationKind,
    NotificationService, Principal, ProviderApplication, Role,
};

/// Provider application use-cases.
#[derive(Clone)]
pub struct ApplicationService {
    applications: Arc<dyn ApplicationRepository>,
    notifications: NotificationService,
    clock: Arc<dyn Clock>,
}

impl ApplicationService {
    /// Wire the service to its collaborators.
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        notifications: NotificationService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            applications,
            notifications,
            clock,
        }
    }

    /// Submit an application to become a provider.
    pub async fn apply(
        &self,
        actor: Principal,
        draft: ApplicationDraft,
    ) -> Result<ProviderApplication, Error> {
        match actor.role {
            Role::Client => {}
            Role::Provider => return Err(Error::conflict("user is already a provider")),
            Role::Admin => return Err(Error::forbidden("client role required")),
        }
        let application = ProviderApplication {
            id: ApplicationId::random(),
            user_id: actor.user_id,
            business_name: draft.business_name,
            bio: draft.bio,
            categories: draft.categories,
            phone: draft.phone,
            status: ApplicationStatus::Pending,
            rejection_reason: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: self.clock.utc(),
        };
        self.applications
            .insert(&application)
            .await
            .map_err(|err| match err {
                RepositoryError::Conflict { .. } => {
                    Error::conflict("an application is already pending review")
                }
                other => map_repository_error(other),
            })?;
        info!(
            application_id = %application.id,
            user_id = %actor.user_id,
            "provider application submitted"
        );
        Ok(application)
    }

    /// The caller's most recent application.
    pub async fn my_application(&self, actor: Principal) -> Result<ProviderApplication, Error> {
        self.applications
            .latest_for_user(actor.user_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("no provider application on file"))
    }

    /// Applications for review, optionally by status.
    pub async fn list(
        &self,
        actor: Principal,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ProviderApplication>, Error> {
        actor.require(Role::Admin)?;
        self.applications
            .list(status)
            .await
            .map_err(map_repository_error)
    }

    /// Approve or reject a pending application and tell the applicant.
    pub async fn decide(
        &self,
        actor: Principal,
        id: ApplicationId,
        decision: Decision,
    ) -> Result<ProviderApplication, Error> {
        actor.require(Role::Admin)?;
        let application = self
            .applications
            .decide(id, &decision, actor.user_id, self.clock.utc())
            .await
            .map_err(|err| match err {
                RepositoryError::Missing { .. } => {
                    Error::not_found(format!("application {id} not found"))
                }
                RepositoryError::Conflict { .. } => {
                    Error::conflict("only pending applications can be decided")
                }
                other => map_repository_error(other),
            })?;
        info!(
            application_id = %id,
            status = application.status.as_str(),
            reviewer = %actor.user_id,
            "provider application decided"
        );
        let (kind, note) = match &decision {
            Decision::Approve => (NotificationKind::ApplicationApproved, None),
            Decision::Reject { reason } => {
                (NotificationKind::ApplicationRejected, Some(reason.as_str()))
            }
        };
        self.notifications
            .notify(application.user_id, kind, Some(*id.as_uuid()), note)
            .await;
        Ok(application)
    }
}
