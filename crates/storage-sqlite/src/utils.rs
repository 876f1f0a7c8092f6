//! Helpers for working with SQLite: IN-list chunking and TEXT decimals.

use std::str::FromStr;

use log::warn;
use rust_decimal::Decimal;

/// Maximum number of parameters for SQLite IN (...) queries.
///
/// Stays well under SQLITE_MAX_VARIABLE_NUMBER so the rest of the statement
/// still has room for its own parameters.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Splits a slice into chunks of at most `SQLITE_MAX_PARAMS_CHUNK` items.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Reads a decimal stored as TEXT. Unparseable values count as zero.
pub fn parse_decimal(column: &str, raw: &str) -> Decimal {
    Decimal::from_str(raw.trim()).unwrap_or_else(|e| {
        warn!("Invalid decimal '{}' in column {}: {}", raw, column, e);
        Decimal::ZERO
    })
}

/// Like [`parse_decimal`] for nullable columns. Blank text reads as `None`.
pub fn parse_optional_decimal(column: &str, raw: Option<&str>) -> Option<Decimal> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| parse_decimal(column, s))
}
