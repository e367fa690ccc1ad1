//! Port abstraction for account persistence.

use async_trait::async_trait;

use crate::domain::{Email, Role, StoredUser, User, UserId};

use super::RepositoryError;

/// Account storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. A taken email yields [`RepositoryError::Conflict`].
    async fn create(&self, user: &StoredUser) -> Result<(), RepositoryError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Fetch an account and its password hash by normalised email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<StoredUser>, RepositoryError>;

    /// Persist profile fields of an existing account.
    async fn update_profile(&self, user: &User) -> Result<(), RepositoryError>;

    /// List accounts, optionally restricted to one role, oldest first.
    async fn list(&self, role: Option<Role>) -> Result<Vec<User>, RepositoryError>;

    /// Number of accounts per role.
    async fn count_by_role(&self) -> Result<Vec<(Role, u64)>, RepositoryError>;
}
