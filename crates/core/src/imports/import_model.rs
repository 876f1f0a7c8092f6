use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::fx::Currency;
use crate::ledger::Period;

/// A spreadsheet row that was skipped. `row` is the 1-based sheet row, the
/// header being row 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRowError {
    pub row: usize,
    pub message: String,
}

impl ImportRowError {
    pub fn new(row: usize, reason: impl fmt::Display) -> Self {
        Self {
            row,
            message: format!("Row {}: {}", row, reason),
        }
    }
}

impl fmt::Display for ImportRowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Preview of a row that made it into the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedRow {
    pub row: usize,
    pub transaction_id: String,
    pub ledger_row_id: String,
    pub category_name: String,
    pub entry_date: NaiveDate,
    pub quarter: Period,
    pub amount: Decimal,
    pub amount_currency: Currency,
    pub amount_converted: Decimal,
    pub ledger_currency: Currency,
    pub custom_rate_applied: bool,
}

/// What the import job committed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportOutcome {
    pub imported: Vec<ImportedRow>,
    pub errors: Vec<ImportRowError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub success: bool,
    pub message: String,
    pub imported_count: usize,
    pub errors: Vec<ImportRowError>,
    pub imported_rows: Vec<ImportedRow>,
}

impl From<ImportOutcome> for ImportSummary {
    fn from(outcome: ImportOutcome) -> Self {
        let imported_count = outcome.imported.len();
        let mut message = format!("Successfully imported {} transactions", imported_count);
        if !outcome.errors.is_empty() {
            message.push_str(&format!(" with {} errors", outcome.errors.len()));
        }
        Self {
            success: true,
            message,
            imported_count,
            errors: outcome.errors,
            imported_rows: outcome.imported,
        }
    }
}
