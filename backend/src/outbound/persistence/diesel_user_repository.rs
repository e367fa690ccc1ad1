//! PostgreSQL-backed `UserRepository`.

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RepositoryError, UserRepository};
use crate::domain::{Email, Role, StoredUser, User, UserId};

use super::error_mapping::map_diesel_error;
use super::models::{UserProfileChangeset, UserRow, convert_rows, tally_rows};
use super::pool::DbPool;
use super::schema::users;

/// Diesel implementation of [`UserRepository`].
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, user: &StoredUser) -> Result<(), RepositoryError> {
        let mut conn = self.pool.connection().await?;
        diesel::insert_into(users::table)
            .values(UserRow::from(user))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let row = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|r| StoredUser::try_from(r).map(|stored| stored.user))
            .transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<StoredUser>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let row = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(StoredUser::try_from).transpose()
    }

    async fn update_profile(&self, user: &User) -> Result<(), RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let changes = UserProfileChangeset {
            display_name: user.display_name.as_ref(),
            locale: user.locale.as_str(),
            phone: user.phone.as_ref().map(AsRef::as_ref),
        };
        let updated = diesel::update(users::table.filter(users::id.eq(user.id.as_uuid())))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(RepositoryError::missing(format!("user {}", user.id)));
        }
        Ok(())
    }

    async fn list(&self, role: Option<Role>) -> Result<Vec<User>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let mut query = users::table
            .select(UserRow::as_select())
            .order_by((users::created_at.asc(), users::id.asc()))
            .into_boxed();
        if let Some(role) = role {
            query = query.filter(users::role.eq(role.as_str()));
        }
        let rows = query.load(&mut conn).await.map_err(map_diesel_error)?;
        let stored: Vec<StoredUser> = convert_rows(rows)?;
        Ok(stored.into_iter().map(|s| s.user).collect())
    }

    async fn count_by_role(&self) -> Result<Vec<(Role, u64)>, RepositoryError> {
        let mut conn = self.pool.connection().await?;
        let rows: Vec<(String, i64)> = users::table
            .group_by(users::role)
            .select((users::role, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        tally_rows(rows)
    }
}
