//! Embedded schema migrations applied at startup.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::domain::ports::RepositoryError;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply pending migrations over a short-lived blocking connection.
///
/// # Errors
///
/// Connection failures map to [`RepositoryError::Connection`]; a failing
/// migration maps to [`RepositoryError::Query`].
pub async fn run_migrations(database_url: &str) -> Result<(), RepositoryError> {
    let url = database_url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&url)
            .map_err(|err| RepositoryError::connection(err.to_string()))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| RepositoryError::query(err.to_string()))?;
        info!(count = applied.len(), "database migrations applied");
        Ok(())
    })
    .await
    .map_err(|err| RepositoryError::query(format!("migration task failed: {err}")))?
}
