//! Core error types for the budget ledger.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use chrono::{NaiveDate, ParseError as ChronoParseError};
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the budget ledger.
///
/// The three classes a caller has to tell apart are validation failures
/// (bad input, nothing written), resolution failures (no ledger row matches,
/// nothing written) and database failures (the whole unit of work rolled back).
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Resolution(#[from] ResolutionError),

    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Failed to convert between currencies: {0}")]
    CurrencyConversionFailed(String),

    #[error("Import failed: {0}")]
    Import(String),
}

impl Error {
    /// Errors that only concern one input row. A bulk import records these
    /// against the row and moves on; everything else aborts the batch.
    pub fn is_row_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Resolution(_) | Error::CurrencyConversionFailed(_)
        )
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A foreign key constraint was violated.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    /// Every missing or malformed field of a submission, reported at once.
    #[error("Missing or invalid fields: {}", .0.join(", "))]
    InvalidFields(Vec<String>),

    /// An amount, or a figure derived from it, is beyond what the ledger
    /// can represent.
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(String),

    /// Two quarter rows of one category and scope cover the same dates.
    #[error("Overlapping quarter ranges: {0}")]
    OverlappingQuarters(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

/// No ledger row could be matched to a transaction.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error(
        "No budget period found for date {date}, category {category}, year {year}{}",
        .cluster.as_ref().map(|c| format!(", cluster {}", c)).unwrap_or_default()
    )]
    QuarterNotFound {
        year: i32,
        category: String,
        cluster: Option<String>,
        date: NaiveDate,
    },

    #[error(
        "More than one budget period covers date {date} for category {category}, year {year}{}",
        .cluster.as_ref().map(|c| format!(", cluster {}", c)).unwrap_or_default()
    )]
    AmbiguousQuarter {
        year: i32,
        category: String,
        cluster: Option<String>,
        date: NaiveDate,
    },

    #[error("No budget data found for the selected category and date")]
    NoBudgetData,

    #[error("Ledger row {0} not found")]
    RowNotFound(String),
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Import(err.to_string())
    }
}

impl From<calamine::Error> for Error {
    fn from(err: calamine::Error) -> Self {
        Error::Import(err.to_string())
    }
}
