//! Database models for transaction records.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use budgetledger_core::fx::{AppliedCustomRates, Currency};
use budgetledger_core::ledger::Period;
use budgetledger_core::transactions::{
    NewTransactionRecord, RecordSnapshot, TransactionRecord, TransactionSource,
};
use budgetledger_core::Result;

use crate::errors::StorageError;
use crate::utils::{parse_decimal, parse_optional_decimal};

/// Columns of `transaction_records` present in every schema version.
#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::transaction_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecordDB {
    pub id: String,
    pub budget_heading: String,
    pub category_name: String,
    pub outcome: String,
    pub activity: String,
    pub budget_line: String,
    pub description: String,
    pub partner: String,
    pub entry_date: NaiveDate,
    pub amount: String,
    pub amount_etb: String,
    pub currency: String,
    pub pv_number: Option<String>,
    pub period: Option<String>,
    pub year: i32,
    pub cluster: Option<String>,
    pub user_id: Option<String>,
    pub source: String,
    pub ledger_row_id: Option<String>,
    pub original_budget: Option<String>,
    pub actual_spent: Option<String>,
    pub forecast_amount: Option<String>,
    pub variance_percentage: Option<String>,
    pub remaining_budget: Option<String>,
    pub created_at: NaiveDateTime,
}

impl TransactionRecordDB {
    pub fn from_new(record: &NewTransactionRecord, id: String, now: NaiveDateTime) -> Self {
        Self {
            id,
            budget_heading: record.budget_heading.clone(),
            category_name: record.category_name.clone(),
            outcome: record.outcome.clone(),
            activity: record.activity.clone(),
            budget_line: record.budget_line.clone(),
            description: record.description.clone(),
            partner: record.partner.clone(),
            entry_date: record.entry_date,
            amount: record.amount.to_string(),
            amount_etb: record.amount_etb.to_string(),
            currency: record.currency.as_str().to_string(),
            pv_number: record.pv_number.clone(),
            period: record.period.map(|p| p.as_str().to_string()),
            year: record.year,
            cluster: record.cluster.clone(),
            user_id: record.user_id.clone(),
            source: record.source.as_str().to_string(),
            ledger_row_id: record.ledger_row_id.clone(),
            original_budget: None,
            actual_spent: None,
            forecast_amount: None,
            variance_percentage: None,
            remaining_budget: None,
            created_at: now,
        }
    }

    fn snapshot(&self) -> Option<RecordSnapshot> {
        let ledger_row_id = self.ledger_row_id.clone()?;
        let original_budget =
            parse_optional_decimal("original_budget", self.original_budget.as_deref())?;
        Some(RecordSnapshot {
            ledger_row_id,
            original_budget,
            actual_spent: parse_optional_decimal("actual_spent", self.actual_spent.as_deref())
                .unwrap_or_default(),
            forecast_amount: parse_optional_decimal(
                "forecast_amount",
                self.forecast_amount.as_deref(),
            )
            .unwrap_or_default(),
            variance_percentage: parse_optional_decimal(
                "variance_percentage",
                self.variance_percentage.as_deref(),
            )
            .unwrap_or_default(),
            remaining_budget: parse_optional_decimal(
                "remaining_budget",
                self.remaining_budget.as_deref(),
            )
            .unwrap_or_default(),
        })
    }

    pub fn into_domain(self, rates: Option<RecordRatesDB>) -> Result<TransactionRecord> {
        let source = TransactionSource::from_str(&self.source)
            .map_err(|_| {
                StorageError::corrupt(
                    "transaction_records",
                    format!("unknown source '{}'", self.source),
                )
            })?;
        let period = match self.period.as_deref() {
            Some(p) => Some(
                Period::from_str(p)
                    .map_err(|_| {
                        StorageError::corrupt("transaction_records", format!("unknown period '{}'", p))
                    })?,
            ),
            None => None,
        };
        let snapshot = self.snapshot();
        let rates = rates.unwrap_or_default();

        Ok(TransactionRecord {
            amount: parse_decimal("amount", &self.amount),
            amount_etb: parse_decimal("amount_etb", &self.amount_etb),
            currency: Currency::parse_or(Some(self.currency.as_str()), Currency::Etb),
            custom_rate_applied: rates.use_custom_rate,
            custom_rates: rates.applied(),
            id: self.id,
            budget_heading: self.budget_heading,
            category_name: self.category_name,
            outcome: self.outcome,
            activity: self.activity,
            budget_line: self.budget_line,
            description: self.description,
            partner: self.partner,
            entry_date: self.entry_date,
            pv_number: self.pv_number,
            period,
            year: self.year,
            cluster: self.cluster,
            user_id: self.user_id,
            source,
            ledger_row_id: self.ledger_row_id,
            snapshot,
            created_at: self.created_at,
        })
    }
}

/// Custom-rate columns of `transaction_records`. Only read or written when
/// the schema has them.
#[derive(Queryable, Selectable, AsChangeset, Serialize, Deserialize, Debug, Clone, Default)]
#[diesel(table_name = crate::schema::transaction_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct RecordRatesDB {
    pub use_custom_rate: bool,
    pub usd_to_etb: Option<String>,
    pub eur_to_etb: Option<String>,
    pub usd_to_eur: Option<String>,
}

impl RecordRatesDB {
    pub fn from_new(record: &NewTransactionRecord) -> Self {
        let rates = &record.custom_rates;
        Self {
            use_custom_rate: record.custom_rate_applied,
            usd_to_etb: rates.usd_to_etb.map(|r| r.to_string()),
            eur_to_etb: rates.eur_to_etb.map(|r| r.to_string()),
            usd_to_eur: rates.usd_to_eur.map(|r| r.to_string()),
        }
    }

    fn applied(&self) -> AppliedCustomRates {
        AppliedCustomRates {
            usd_to_etb: parse_optional_decimal("usd_to_etb", self.usd_to_etb.as_deref()),
            eur_to_etb: parse_optional_decimal("eur_to_etb", self.eur_to_etb.as_deref()),
            usd_to_eur: parse_optional_decimal("usd_to_eur", self.usd_to_eur.as_deref()),
        }
    }
}

/// Ledger link and figures copied onto a record once it has been applied.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::transaction_records)]
pub struct RecordSnapshotChangeset {
    pub ledger_row_id: Option<String>,
    pub original_budget: Option<String>,
    pub actual_spent: Option<String>,
    pub forecast_amount: Option<String>,
    pub variance_percentage: Option<String>,
    pub remaining_budget: Option<String>,
}

impl From<&RecordSnapshot> for RecordSnapshotChangeset {
    fn from(snapshot: &RecordSnapshot) -> Self {
        Self {
            ledger_row_id: Some(snapshot.ledger_row_id.clone()),
            original_budget: Some(snapshot.original_budget.to_string()),
            actual_spent: Some(snapshot.actual_spent.to_string()),
            forecast_amount: Some(snapshot.forecast_amount.to_string()),
            variance_percentage: Some(snapshot.variance_percentage.to_string()),
            remaining_budget: Some(snapshot.remaining_budget.to_string()),
        }
    }
}
