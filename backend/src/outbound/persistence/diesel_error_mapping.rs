//! Shared Diesel error mapping for the repositories.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// Constructors a repository error enum exposes to the shared mapper.
pub(crate) trait DieselErrorSink: Sized {
    fn connection_failed(message: String) -> Self;
    fn query_failed(message: String) -> Self;
    fn constraint_violated(constraint: String) -> Self;

    /// A foreign key pointed at a row that no longer exists.
    fn reference_missing(constraint: String) -> Self {
        Self::query_failed(format!("foreign key {constraint} violated"))
    }
}

/// Map a Diesel error onto a repository error.
///
/// Unique and foreign-key violations keep the constraint name so callers can
/// tell which key collided or which reference dangled.
pub(crate) fn map_diesel_error<E: DieselErrorSink>(error: DieselError) -> E {
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
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            E::constraint_violated(info.constraint_name().unwrap_or("unknown").to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            E::reference_missing(info.constraint_name().unwrap_or("unknown").to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            E::connection_failed("database connection error".to_owned())
        }
        DieselError::NotFound => E::query_failed("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => E::query_failed("database query error".to_owned()),
        _ => E::query_failed("database error".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::DatabaseErrorInformation;
    use rstest::rstest;

    #[derive(Debug, PartialEq, Eq)]
    enum Mapped {
        Connection(String),
        Query(String),
        Conflict(String),
        Dangling(String),
    }

    impl DieselErrorSink for Mapped {
        fn connection_failed(message: String) -> Self {
            Self::Connection(message)
        }
        fn query_failed(message: String) -> Self {
            Self::Query(message)
        }
        fn constraint_violated(constraint: String) -> Self {
            Self::Conflict(constraint)
        }
        fn reference_missing(constraint: String) -> Self {
            Self::Dangling(constraint)
        }
    }

    /// Sink relying on the default foreign-key mapping.
    #[derive(Debug, PartialEq, Eq)]
    struct QueryOnly(String);

    impl DieselErrorSink for QueryOnly {
        fn connection_failed(message: String) -> Self {
            Self(message)
        }
        fn query_failed(message: String) -> Self {
            Self(message)
        }
        fn constraint_violated(constraint: String) -> Self {
            Self(constraint)
        }
    }

    struct Info(Option<&'static str>);

    impl DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("users")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            self.0
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    #[rstest]
    fn unique_violation_carries_constraint() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(Info(Some("users_email_key"))),
        );
        assert_eq!(
            map_diesel_error::<Mapped>(error),
            Mapped::Conflict("users_email_key".to_owned())
        );
    }

    #[rstest]
    fn foreign_key_violation_carries_constraint() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new(Info(Some("devices_owner_fkey"))),
        );
        assert_eq!(
            map_diesel_error::<Mapped>(error),
            Mapped::Dangling("devices_owner_fkey".to_owned())
        );
    }

    #[rstest]
    fn foreign_key_violation_defaults_to_query_failure() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new(Info(Some("devices_owner_fkey"))),
        );
        assert_eq!(
            map_diesel_error::<QueryOnly>(error),
            QueryOnly("foreign key devices_owner_fkey violated".to_owned())
        );
    }

    #[rstest]
    fn closed_connection_maps_to_connection() {
        let error =
            DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, Box::new(Info(None)));
        assert!(matches!(map_diesel_error::<Mapped>(error), Mapped::Connection(_)));
    }

    #[rstest]
    fn other_errors_map_to_query() {
        assert_eq!(
            map_diesel_error::<Mapped>(DieselError::NotFound),
            Mapped::Query("record not found".to_owned())
        );
    }
}
