//! Mapping helpers shared by the domain services.

use super::Error;
use super::ports::RepositoryError;

/// Translate a repository failure into an HTTP-safe domain error.
pub(crate) fn map_repository_error(error: RepositoryError) -> Error {
    if error.is_transient() {
        return Error::service_unavailable(format!("repository unavailable: {error}"));
    }
    match error {
        RepositoryError::Connection { message } | RepositoryError::Query { message } => {
            Error::internal(format!("repository error: {message}"))
        }
        RepositoryError::Conflict { message } => Error::conflict(message),
        RepositoryError::Missing { message } => Error::not_found(message),
    }
}

/// Field-scoped validation error using the stable `invalid_value` code.
pub(crate) fn invalid_value(field: &str, message: impl std::fmt::Display) -> Error {
    Error::invalid_field(field, "invalid_value", message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(RepositoryError::connection("down"), ErrorCode::ServiceUnavailable)]
    #[case(RepositoryError::query("syntax"), ErrorCode::InternalError)]
    #[case(RepositoryError::conflict("taken"), ErrorCode::Conflict)]
    #[case(RepositoryError::missing("gone"), ErrorCode::NotFound)]
    fn repository_errors_map_to_codes(#[case] error: RepositoryError, #[case] code: ErrorCode) {
        assert_eq!(map_repository_error(error).code(), code);
    }

    #[rstest]
    fn invalid_value_carries_field_details() {
        let error = invalid_value("rating", "rating must be between 1 and 5");
        let details = error.details().expect("details");
        assert_eq!(details["field"], "rating");
        assert_eq!(details["code"], "invalid_value");
    }
}
