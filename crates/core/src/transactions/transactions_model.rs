use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::context::RequestContext;
use crate::errors::{Error, ValidationError};
use crate::fx::{AppliedCustomRates, Currency, CustomRateRequest, EffectiveRates, ExchangeRates};
use crate::ledger::{LedgerRow, Period};

/// Where a transaction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSource {
    Entry,
    Import,
}

impl TransactionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionSource::Entry => "entry",
            TransactionSource::Import => "import",
        }
    }
}

impl FromStr for TransactionSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entry" => Ok(TransactionSource::Entry),
            "import" => Ok(TransactionSource::Import),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown transaction source '{}'",
                other
            ))
            .into()),
        }
    }
}

impl fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts `true`, `1`, `"1"`, `"true"` and `"on"` as a set flag.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Str(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i == 1,
        Some(Flag::Str(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        None => false,
    })
}

/// A transaction as entered on the form. Every field is raw text so that
/// validation can report all problems at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSubmission {
    pub budget_heading: Option<String>,
    pub outcome: Option<String>,
    pub activity: Option<String>,
    pub budget_line: Option<String>,
    pub description: Option<String>,
    pub partner: Option<String>,
    pub entry_date: Option<String>,
    /// Amount in ETB.
    pub amount: Option<String>,
    pub pv_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub use_custom_rate: bool,
    pub usd_to_etb: Option<String>,
    pub eur_to_etb: Option<String>,
    pub usd_to_eur: Option<String>,
}

/// The descriptive fields of a validated transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEntry {
    pub budget_heading: String,
    /// `budget_heading` with its numbering stripped.
    pub category: String,
    pub outcome: String,
    pub activity: String,
    pub budget_line: String,
    pub description: String,
    pub partner: String,
    pub entry_date: NaiveDate,
    pub amount: Decimal,
    pub pv_number: Option<String>,
}

/// A validated transaction with everything needed to apply it.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub entry: TransactionEntry,
    /// Budget year of the ledger rows the transaction lands on.
    pub year: i32,
    /// Currency `entry.amount` is expressed in.
    pub amount_currency: Currency,
    pub rates: EffectiveRates,
    pub context: RequestContext,
    pub source: TransactionSource,
}

/// Fields written when a transaction record is created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransactionRecord {
    pub budget_heading: String,
    pub category_name: String,
    pub outcome: String,
    pub activity: String,
    pub budget_line: String,
    pub description: String,
    pub partner: String,
    pub entry_date: NaiveDate,
    /// Amount in the ledger row's currency.
    pub amount: Decimal,
    pub amount_etb: Decimal,
    pub currency: Currency,
    pub pv_number: Option<String>,
    pub period: Option<Period>,
    pub year: i32,
    pub cluster: Option<String>,
    pub user_id: Option<String>,
    pub source: TransactionSource,
    pub ledger_row_id: Option<String>,
    pub custom_rate_applied: bool,
    pub custom_rates: AppliedCustomRates,
}

/// Figures copied from the ledger row onto a record after it was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSnapshot {
    pub ledger_row_id: String,
    pub original_budget: Decimal,
    pub actual_spent: Decimal,
    pub forecast_amount: Decimal,
    pub variance_percentage: Decimal,
    pub remaining_budget: Decimal,
}

impl From<&LedgerRow> for RecordSnapshot {
    fn from(row: &LedgerRow) -> Self {
        Self {
            ledger_row_id: row.id.clone(),
            original_budget: row.figures.budget,
            actual_spent: row.figures.actual,
            forecast_amount: row.figures.forecast,
            variance_percentage: row.figures.variance_percentage,
            // the forecast is what the quarter still expects to spend
            remaining_budget: row.figures.forecast,
        }
    }
}

/// A stored transaction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub budget_heading: String,
    pub category_name: String,
    pub outcome: String,
    pub activity: String,
    pub budget_line: String,
    pub description: String,
    pub partner: String,
    pub entry_date: NaiveDate,
    pub amount: Decimal,
    pub amount_etb: Decimal,
    pub currency: Currency,
    pub pv_number: Option<String>,
    pub period: Option<Period>,
    pub year: i32,
    pub cluster: Option<String>,
    pub user_id: Option<String>,
    pub source: TransactionSource,
    pub ledger_row_id: Option<String>,
    pub snapshot: Option<RecordSnapshot>,
    pub custom_rate_applied: bool,
    pub custom_rates: AppliedCustomRates,
    pub created_at: NaiveDateTime,
}

/// What applying one transaction to the ledger produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedTransaction {
    pub record_id: String,
    /// The quarter row after the update.
    pub ledger_row: LedgerRow,
    pub amount_entered: Decimal,
    pub amount_currency: Currency,
    pub amount_converted: Decimal,
    pub rates: EffectiveRates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub success: bool,
    pub message: String,
    pub transaction_id: String,
    pub ledger_row_id: String,
    pub quarter: Period,
    /// Amount as entered, in ETB.
    pub amount_entered: Decimal,
    /// Amount in the ledger row's currency.
    pub amount_converted: Decimal,
    pub currency: Currency,
    pub rates_used: ExchangeRates,
    pub custom_rate_applied: bool,
    pub ledger_row: LedgerRow,
}

impl From<AppliedTransaction> for SubmissionResult {
    fn from(applied: AppliedTransaction) -> Self {
        Self {
            success: true,
            message: "Transaction added successfully".to_string(),
            transaction_id: applied.record_id,
            ledger_row_id: applied.ledger_row.id.clone(),
            quarter: applied.ledger_row.period,
            amount_entered: applied.amount_entered,
            amount_converted: applied.amount_converted,
            currency: applied.ledger_row.currency,
            rates_used: applied.rates.rates,
            custom_rate_applied: applied.rates.custom_applied,
            ledger_row: applied.ledger_row,
        }
    }
}

/// Read-only question: how much is left for this heading on this date?
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCheckRequest {
    pub budget_heading: Option<String>,
    pub entry_date: Option<String>,
    /// Amount in ETB.
    pub amount: Option<String>,
    /// Defaults to the year of `entry_date`.
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub use_custom_rate: bool,
    pub usd_to_etb: Option<String>,
    pub eur_to_etb: Option<String>,
}

impl BudgetCheckRequest {
    pub fn custom_rates(&self) -> CustomRateRequest {
        CustomRateRequest {
            use_custom_rate: self.use_custom_rate,
            usd_to_etb: parse_rate(self.usd_to_etb.as_deref()),
            eur_to_etb: parse_rate(self.eur_to_etb.as_deref()),
            usd_to_eur: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCheck {
    /// `max(budget - actual, 0)` in the ledger row's currency.
    pub budget_available: Decimal,
    pub budget_available_etb: Decimal,
    pub entered_amount: Decimal,
    pub entered_amount_etb: Decimal,
    pub currency: Currency,
    pub quarter: Period,
    pub rates_used: ExchangeRates,
}

/// Lenient rate parsing: anything that is not a number is treated as absent.
pub(crate) fn parse_rate(raw: Option<&str>) -> Option<Decimal> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<Decimal>().ok())
}
