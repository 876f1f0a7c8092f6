//! Database models for ledger rows.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use budgetledger_core::fx::Currency;
use budgetledger_core::ledger::{CertificationStatus, LedgerFigures, LedgerRow, NewLedgerRow, Period};
use budgetledger_core::Result;

use crate::errors::StorageError;
use crate::utils::parse_decimal;

#[derive(Queryable, Identifiable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::ledger_rows)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct LedgerRowDB {
    pub id: String,
    pub year: i32,
    pub category_name: String,
    pub cluster: Option<String>,
    pub period: String,
    pub budget: String,
    pub actual: String,
    pub forecast: String,
    pub actual_plus_forecast: String,
    pub variance_percentage: String,
    pub currency: String,
    pub certified: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl LedgerRowDB {
    pub fn into_domain(self) -> Result<LedgerRow> {
        let period = Period::from_str(&self.period).map_err(|_| {
            StorageError::corrupt(
                "ledger_rows",
                format!("unknown period '{}' on {}", self.period, self.id),
            )
        })?;

        Ok(LedgerRow {
            figures: LedgerFigures {
                budget: parse_decimal("budget", &self.budget),
                actual: parse_decimal("actual", &self.actual),
                forecast: parse_decimal("forecast", &self.forecast),
                actual_plus_forecast: parse_decimal(
                    "actual_plus_forecast",
                    &self.actual_plus_forecast,
                ),
                variance_percentage: parse_decimal(
                    "variance_percentage",
                    &self.variance_percentage,
                ),
            },
            currency: Currency::parse_or(Some(self.currency.as_str()), Currency::Etb),
            certified: self.certified.parse().unwrap_or_default(),
            id: self.id,
            year: self.year,
            category_name: self.category_name,
            cluster: self.cluster,
            period,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::ledger_rows)]
#[serde(rename_all = "camelCase")]
pub struct NewLedgerRowDB {
    pub id: String,
    pub year: i32,
    pub category_name: String,
    pub cluster: Option<String>,
    pub period: String,
    pub budget: String,
    pub actual: String,
    pub forecast: String,
    pub actual_plus_forecast: String,
    pub variance_percentage: String,
    pub currency: String,
    pub certified: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewLedgerRowDB {
    pub fn from_domain(row: &NewLedgerRow, id: String, now: NaiveDateTime) -> Result<Self> {
        let figures = row.figures()?;
        Ok(Self {
            id,
            year: row.year,
            category_name: row.category_name.trim().to_string(),
            cluster: row.cluster.clone(),
            period: row.period.as_str().to_string(),
            budget: figures.budget.to_string(),
            actual: figures.actual.to_string(),
            forecast: figures.forecast.to_string(),
            actual_plus_forecast: figures.actual_plus_forecast.to_string(),
            variance_percentage: figures.variance_percentage.to_string(),
            currency: row.currency.unwrap_or(Currency::Etb).as_str().to_string(),
            certified: CertificationStatus::Uncertified.as_str().to_string(),
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: now,
            updated_at: now,
        })
    }
}

/// The money columns of a ledger row as written by an update.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::ledger_rows)]
pub struct LedgerFiguresChangeset {
    pub budget: String,
    pub actual: String,
    pub forecast: String,
    pub actual_plus_forecast: String,
    pub variance_percentage: String,
    pub updated_at: NaiveDateTime,
}

impl LedgerFiguresChangeset {
    pub fn new(figures: &LedgerFigures, now: NaiveDateTime) -> Self {
        Self {
            budget: figures.budget.to_string(),
            actual: figures.actual.to_string(),
            forecast: figures.forecast.to_string(),
            actual_plus_forecast: figures.actual_plus_forecast.to_string(),
            variance_percentage: figures.variance_percentage.to_string(),
            updated_at: now,
        }
    }
}
