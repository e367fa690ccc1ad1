//! Diesel error mapping shared by every repository.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::RepositoryError;

/// Map Diesel failures onto the repository error vocabulary.
///
/// Unique violations become conflicts so services can answer 409; the
/// constraint name is kept in the message for logs.
pub(crate) fn map_diesel_error(error: DieselError) -> RepositoryError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => RepositoryError::missing("record not found"),
        DieselError::QueryBuilderError(_) => RepositoryError::query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            RepositoryError::conflict(
                info.constraint_name()
                    .map_or_else(|| "unique constraint".to_owned(), str::to_owned),
            )
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            RepositoryError::connection("database connection error")
        }
        _ => RepositoryError::query("database error"),
    }
}
