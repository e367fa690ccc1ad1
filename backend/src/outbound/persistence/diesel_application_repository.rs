//! PostgreSQL-backed `ApplicationRepository`.
//!
//! Decisions run in one transaction: the application row is locked, checked
//! for `pending`, updated, and on approval the applicant's role is raised to
//! `provider`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{ApplicationRepository, RepositoryError};
use crate::domain::{
    ApplicationId, ApplicationStatus, Decision, ProviderApplication, Role, UserId,
};

use super::error_mapping::map_diesel_error;
use super::models::{ApplicationRow, convert_rows};
use super::pool::DbPool;
use super::schema::{provider_applications, users};

/// Diesel implementation of [`ApplicationRepository`].
#[derive(Clone)]
pub struct DieselApplicationRepository {
    pool: DbPool,
}

impl DieselApplicationRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside the decision transaction.
enum DecideError {
    Repository(RepositoryError),
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for DecideError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

impl From<DecideError> for RepositoryError {
    fn from(error: DecideError) -> Self {
        match error {
            DecideError::Repository(err) => err,
            DecideError::Diesel(err) => map_diesel_error(err),
        }
    }
}

#[async_trait]
impl ApplicationRepository for DieselApplicationRepository {
    async fn insert(&self, application: &ProviderApplication) -> Result<(), RepositoryError> {
        let mut conn = self.pool.connection().await?;
        diesel::insert_into(provider_applications::table)
            .values(ApplicationRow::from(application))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        id: ApplicationId,
    ) -> Result<Option<ProviderApplication>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let row = provider_applications::table
            .filter(provider_applications::id.eq(id.as_uuid()))
            .select(ApplicationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(ProviderApplication::try_from).transpose()
    }

    async fn latest_for_user(
        &self,
        user: UserId,
    ) -> Result<Option<ProviderApplication>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let row = provider_applications::table
            .filter(provider_applications::user_id.eq(user.as_uuid()))
            .select(ApplicationRow::as_select())
            .order_by(provider_applications::created_at.desc())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(ProviderApplication::try_from).transpose()
    }

    async fn list(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ProviderApplication>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let mut query = provider_applications::table
            .select(ApplicationRow::as_select())
            .order_by(provider_applications::created_at.asc())
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(provider_applications::status.eq(status.as_str()));
        }
        let rows = query.load(&mut conn).await.map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn decide(
        &self,
        id: ApplicationId,
        decision: &Decision,
        reviewer: UserId,
        at: DateTime<Utc>,
    ) -> Result<ProviderApplication, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let id = *id.as_uuid();
        let reviewer = *reviewer.as_uuid();
        let (status, reason) = match decision {
            Decision::Approve => (ApplicationStatus::Approved, None),
            Decision::Reject { reason } => (ApplicationStatus::Rejected, Some(reason.clone())),
        };

        let row = conn
            .transaction::<ApplicationRow, DecideError, _>(|conn| {
                async move {
                    let current: ApplicationRow = provider_applications::table
                        .filter(provider_applications::id.eq(id))
                        .select(ApplicationRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?
                        .ok_or_else(|| {
                            DecideError::Repository(RepositoryError::missing(format!(
                                "application {id}"
                            )))
                        })?;
                    if current.status != ApplicationStatus::Pending.as_str() {
                        return Err(DecideError::Repository(RepositoryError::conflict(
                            format!("application {id} is {}", current.status),
                        )));
                    }

                    let updated = diesel::update(
                        provider_applications::table.filter(provider_applications::id.eq(id)),
                    )
                    .set((
                        provider_applications::status.eq(status.as_str()),
                        provider_applications::rejection_reason.eq(reason),
                        provider_applications::reviewed_by.eq(Some(reviewer)),
                        provider_applications::reviewed_at.eq(Some(at)),
                    ))
                    .returning(ApplicationRow::as_returning())
                    .get_result(conn)
                    .await?;

                    if status == ApplicationStatus::Approved {
                        diesel::update(users::table.filter(users::id.eq(current.user_id)))
                            .set(users::role.eq(Role::Provider.as_str()))
                            .execute(conn)
                            .await?;
                    }
                    Ok(updated)
                }
                .scope_boxed()
            })
            .await?;
        ProviderApplication::try_from(row)
    }
}
