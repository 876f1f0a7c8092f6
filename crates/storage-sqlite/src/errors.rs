//! Storage-specific error types for SQLite operations.
//!
//! Diesel and r2d2 failures are wrapped here and converted to the
//! database-agnostic types of `budgetledger_core` at the crate boundary.

use budgetledger_core::errors::{DatabaseError, Error};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Storage-specific errors that wrap Diesel and r2d2 types.
///
/// These never leave the crate; callers see `budgetledger_core::Error`.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    /// A domain error raised by a job running inside a write transaction.
    /// It is carried through untouched so callers can still tell a
    /// validation or resolution failure from a database one.
    #[error(transparent)]
    Core(#[from] Error),
}

impl StorageError {
    pub fn corrupt(table: &'static str, reason: impl ToString) -> Self {
        StorageError::CorruptRow {
            table,
            reason: reason.to_string(),
        }
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            }
            StorageError::PoolError(e) => {
                Error::Database(DatabaseError::PoolCreationFailed(e.to_string()))
            }
            StorageError::QueryFailed(DieselError::NotFound) => {
                Error::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            StorageError::QueryFailed(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                info,
            )) => Error::Database(DatabaseError::UniqueViolation(info.message().to_string())),
            StorageError::QueryFailed(DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                info,
            )) => Error::Database(DatabaseError::ForeignKeyViolation(
                info.message().to_string(),
            )),
            StorageError::QueryFailed(e) => {
                Error::Database(DatabaseError::QueryFailed(e.to_string()))
            }
            StorageError::MigrationFailed(e) => Error::Database(DatabaseError::MigrationFailed(e)),
            StorageError::CorruptRow { table, reason } => Error::Database(
                DatabaseError::Internal(format!("Corrupt row in {}: {}", table, reason)),
            ),
            StorageError::Core(e) => e,
        }
    }
}

/// Extension trait for converting Diesel and r2d2 results to core results.
pub trait IntoCore<T> {
    fn into_core(self) -> budgetledger_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, DieselError> {
    fn into_core(self) -> budgetledger_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, r2d2::Error> {
    fn into_core(self) -> budgetledger_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetledger_core::errors::ResolutionError;

    #[test]
    fn domain_errors_survive_the_round_trip() {
        let original: Error = ResolutionError::NoBudgetData.into();
        let back: Error = StorageError::from(original).into();
        assert!(matches!(back, Error::Resolution(ResolutionError::NoBudgetData)));
    }

    #[test]
    fn diesel_not_found_maps_to_database_not_found() {
        let err: Error = StorageError::from(DieselError::NotFound).into();
        assert!(matches!(err, Error::Database(DatabaseError::NotFound(_))));
        assert!(!err.is_row_recoverable());
    }
}
