use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::ledger_model::{CertificationStatus, LedgerRow, LedgerScope, NewLedgerRow, Period};
use super::ledger_traits::LedgerRepositoryTrait;
use crate::constants::GRAND_TOTAL;
use crate::errors::{Result, ValidationError};

/// Trait defining the contract for ledger administration.
#[async_trait]
pub trait LedgerServiceTrait: Send + Sync {
    fn list_rows(&self, scope: &LedgerScope) -> Result<Vec<LedgerRow>>;
    fn get_row(&self, id: &str) -> Result<LedgerRow>;
    async fn seed_rows(&self, rows: Vec<NewLedgerRow>) -> Result<Vec<LedgerRow>>;
    async fn certify(&self, scope: LedgerScope) -> Result<usize>;
}

pub struct LedgerService {
    repository: Arc<dyn LedgerRepositoryTrait>,
}

impl LedgerService {
    pub fn new(repository: Arc<dyn LedgerRepositoryTrait>) -> Self {
        Self { repository }
    }
}

/// Checks a batch of rows for period setup.
///
/// Quarter rows need a date range with start <= end, and the quarter ranges of
/// one (year, category, cluster) may not share a date. Within the batch there
/// may be only one row per (year, category, cluster, period), and the grand
/// total row must be named "Total".
pub fn validate_seed_rows(rows: &[NewLedgerRow]) -> Result<()> {
    if rows.is_empty() {
        return Err(ValidationError::InvalidInput("No ledger rows supplied".to_string()).into());
    }

    let mut seen = HashSet::new();
    let mut ranges: Vec<(&NewLedgerRow, NaiveDate, NaiveDate)> = Vec::new();
    for row in rows {
        let label = format!("{} {} {}", row.year, row.category_name, row.period);
        if row.category_name.trim().is_empty() {
            return Err(ValidationError::MissingField("categoryName".to_string()).into());
        }
        if !seen.insert((row.year, row.category_name.trim(), row.cluster.as_deref(), row.period)) {
            return Err(ValidationError::InvalidInput(format!("Duplicate ledger row: {}", label)).into());
        }
        match row.period {
            p if p.is_quarter() => match (row.start_date, row.end_date) {
                (Some(start), Some(end)) if start <= end => {
                    let overlapping = ranges.iter().find(|(other, o_start, o_end)| {
                        other.year == row.year
                            && other.category_name.trim() == row.category_name.trim()
                            && other.cluster == row.cluster
                            && *o_start <= end
                            && start <= *o_end
                    });
                    if let Some((other, _, _)) = overlapping {
                        return Err(ValidationError::OverlappingQuarters(format!(
                            "{} overlaps {}",
                            label, other.period
                        ))
                        .into());
                    }
                    ranges.push((row, start, end));
                }
                (Some(_), Some(_)) => {
                    return Err(ValidationError::InvalidInput(format!(
                        "Start date after end date for {}",
                        label
                    ))
                    .into())
                }
                _ => {
                    return Err(ValidationError::InvalidInput(format!(
                        "Quarter row {} needs a start and end date",
                        label
                    ))
                    .into())
                }
            },
            Period::Total if row.category_name.trim() != GRAND_TOTAL => {
                return Err(ValidationError::InvalidInput(format!(
                    "The Total row must use category '{}'",
                    GRAND_TOTAL
                ))
                .into())
            }
            _ => {}
        }
        row.figures()?;
    }
    Ok(())
}

#[async_trait]
impl LedgerServiceTrait for LedgerService {
    fn list_rows(&self, scope: &LedgerScope) -> Result<Vec<LedgerRow>> {
        self.repository.list_rows(scope)
    }

    fn get_row(&self, id: &str) -> Result<LedgerRow> {
        self.repository.get_row(id)
    }

    async fn seed_rows(&self, rows: Vec<NewLedgerRow>) -> Result<Vec<LedgerRow>> {
        validate_seed_rows(&rows)?;
        let count = rows.len();
        let inserted = self.repository.insert_rows(rows).await?;
        log::info!("Seeded {} ledger rows", count);
        Ok(inserted)
    }

    async fn certify(&self, scope: LedgerScope) -> Result<usize> {
        let year = scope.year;
        let touched = self
            .repository
            .set_certification(scope, CertificationStatus::Certified)
            .await?;
        log::info!("Certified {} ledger rows for year {}", touched, year);
        Ok(touched)
    }
}
