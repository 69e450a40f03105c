//! Shared Diesel error mapping for the segment repositories.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, warn};

use super::pool::PoolError;

/// Constraint outcome a repository may translate into a domain variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation<'a> {
    /// Primary key or unique index collision.
    Unique,
    /// Foreign key reference to a missing row, with the constraint name when
    /// the server reports it.
    ForeignKey(Option<&'a str>),
}

/// Extract a readable message from a pool error.
pub(crate) fn pool_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Map a Diesel error, giving `violation` the first chance to translate
/// constraint failures into a domain-specific error.
///
/// Anything `violation` declines falls back to `query` or `connection`.
pub(crate) fn map_diesel_error<E, V, Q, C>(
    error: DieselError,
    violation: V,
    query: Q,
    connection: C,
) -> E
where
    V: FnOnce(Violation<'_>) -> Option<E>,
    Q: FnOnce(&'static str) -> E,
    C: FnOnce(&'static str) -> E,
{
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            violation(Violation::Unique).unwrap_or_else(|| query("unique constraint violated"))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            let constraint = info.constraint_name();
            violation(Violation::ForeignKey(constraint)).unwrap_or_else(|| {
                warn!(
                    message = info.message(),
                    constraint_name = ?constraint,
                    "unrecognised foreign key violation"
                );
                query("foreign key violation")
            })
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        _ => query("database error"),
    }
}

/// Decline every constraint violation.
pub(crate) fn no_violation<E>(_: Violation<'_>) -> Option<E> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, PartialEq, Eq)]
    enum Mapped {
        Duplicate,
        Query(&'static str),
        Connection(&'static str),
    }

    fn map(error: DieselError) -> Mapped {
        map_diesel_error(
            error,
            |violation| (violation == Violation::Unique).then_some(Mapped::Duplicate),
            Mapped::Query,
            Mapped::Connection,
        )
    }

    #[rstest]
    fn not_found_is_a_query_error() {
        assert_eq!(map(DieselError::NotFound), Mapped::Query("record not found"));
    }

    #[rstest]
    fn unique_violation_uses_the_translator() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_owned()),
        );
        assert_eq!(map(error), Mapped::Duplicate);
    }

    #[rstest]
    fn declined_foreign_key_violation_falls_back_to_query() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new("insert violates foreign key constraint".to_owned()),
        );
        assert_eq!(map(error), Mapped::Query("foreign key violation"));
    }

    #[rstest]
    fn closed_connection_is_a_connection_error() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_owned()),
        );
        assert_eq!(map(error), Mapped::Connection("database connection error"));
    }

    #[rstest]
    fn pool_messages_are_extracted() {
        assert_eq!(pool_message(PoolError::checkout("timed out")), "timed out");
    }
}
