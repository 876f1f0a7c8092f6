use super::ledger_model::{LedgerRow, Period, QuarterQuery};
use crate::errors::{ResolutionError, Result};
use crate::settings::QuarterFallback;

/// Lookup of quarter rows, implemented by storage.
pub trait QuarterSource {
    /// Quarter rows whose stored date range contains `query.date`, earliest
    /// start first.
    fn quarters_containing(&mut self, query: &QuarterQuery) -> Result<Vec<LedgerRow>>;

    /// The quarter row labelled `period`, regardless of its date range.
    fn quarter_by_period(&mut self, query: &QuarterQuery, period: Period)
        -> Result<Option<LedgerRow>>;
}

/// Maps a transaction date to its quarter row.
///
/// Stored ranges win. The calendar-month heuristic is only consulted when
/// `fallback` allows it and no stored range matched. Two stored ranges of the
/// same cluster covering the date is an error, never a silent pick.
pub fn resolve_quarter<S>(
    source: &mut S,
    query: &QuarterQuery,
    fallback: QuarterFallback,
) -> Result<LedgerRow>
where
    S: QuarterSource + ?Sized,
{
    let mut matches = source.quarters_containing(query)?.into_iter();
    if let Some(row) = matches.next() {
        if matches.any(|other| other.cluster == row.cluster) {
            return Err(ResolutionError::AmbiguousQuarter {
                year: query.year,
                category: query.category.clone(),
                cluster: row.cluster,
                date: query.date,
            }
            .into());
        }
        return Ok(row);
    }

    if fallback == QuarterFallback::Calendar {
        let period = Period::calendar_quarter(query.date);
        if let Some(row) = source.quarter_by_period(query, period)? {
            log::debug!(
                "No stored range covers {} for '{}', using calendar quarter {}",
                query.date,
                query.category,
                period
            );
            return Ok(row);
        }
    }

    Err(ResolutionError::QuarterNotFound {
        year: query.year,
        category: query.category.clone(),
        cluster: query.cluster.clone(),
        date: query.date,
    }
    .into())
}
