use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ledger_calculations::{actual_plus_forecast, variance_percentage};
use crate::constants::{ANNUAL_TOTAL_PERIOD, GRAND_TOTAL};
use crate::errors::{Error, ValidationError};
use crate::fx::Currency;

/// The period a ledger row covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Period {
    Q1,
    Q2,
    Q3,
    Q4,
    #[serde(rename = "Annual Total")]
    AnnualTotal,
    #[serde(rename = "Total")]
    Total,
}

impl Period {
    pub const QUARTERS: [Period; 4] = [Period::Q1, Period::Q2, Period::Q3, Period::Q4];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Q1 => "Q1",
            Period::Q2 => "Q2",
            Period::Q3 => "Q3",
            Period::Q4 => "Q4",
            Period::AnnualTotal => ANNUAL_TOTAL_PERIOD,
            Period::Total => GRAND_TOTAL,
        }
    }

    pub fn is_quarter(&self) -> bool {
        Self::QUARTERS.contains(self)
    }

    /// Calendar quarter of a date.
    pub fn calendar_quarter(date: NaiveDate) -> Period {
        match date.month() {
            1..=3 => Period::Q1,
            4..=6 => Period::Q2,
            7..=9 => Period::Q3,
            _ => Period::Q4,
        }
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Q1" => Ok(Period::Q1),
            "Q2" => Ok(Period::Q2),
            "Q3" => Ok(Period::Q3),
            "Q4" => Ok(Period::Q4),
            ANNUAL_TOTAL_PERIOD => Ok(Period::AnnualTotal),
            GRAND_TOTAL => Ok(Period::Total),
            other => Err(ValidationError::InvalidInput(format!("Unknown period '{}'", other)).into()),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificationStatus {
    Certified,
    #[default]
    Uncertified,
}

impl CertificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificationStatus::Certified => "certified",
            CertificationStatus::Uncertified => "uncertified",
        }
    }
}

impl FromStr for CertificationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "certified" => Ok(CertificationStatus::Certified),
            "uncertified" | "" => Ok(CertificationStatus::Uncertified),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown certification status '{}'",
                other
            ))
            .into()),
        }
    }
}

/// The money columns of a ledger row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerFigures {
    pub budget: Decimal,
    pub actual: Decimal,
    pub forecast: Decimal,
    pub actual_plus_forecast: Decimal,
    pub variance_percentage: Decimal,
}

impl LedgerFigures {
    pub fn new(budget: Decimal, actual: Decimal, forecast: Decimal) -> crate::errors::Result<Self> {
        Self {
            budget,
            actual,
            forecast,
            ..Default::default()
        }
        .with_derived()
    }

    /// Recomputes `actual_plus_forecast` and `variance_percentage` from the
    /// stored amounts.
    pub fn with_derived(mut self) -> crate::errors::Result<Self> {
        self.actual_plus_forecast = actual_plus_forecast(self.actual, self.forecast)?;
        self.variance_percentage = variance_percentage(self.budget, self.actual)?;
        Ok(self)
    }

    /// Money still unspent, never negative.
    pub fn available(&self) -> Decimal {
        self.budget.saturating_sub(self.actual).max(Decimal::ZERO)
    }
}

/// One (year, category, cluster, period) budget record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRow {
    pub id: String,
    pub year: i32,
    pub category_name: String,
    pub cluster: Option<String>,
    pub period: Period,
    #[serde(flatten)]
    pub figures: LedgerFigures,
    pub currency: Currency,
    pub certified: CertificationStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl LedgerRow {
    pub fn scope(&self) -> LedgerScope {
        LedgerScope {
            year: self.year,
            cluster: self.cluster.clone(),
        }
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => start <= date && date <= end,
            _ => false,
        }
    }
}

/// Input for seeding a ledger row at period setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLedgerRow {
    pub year: i32,
    pub category_name: String,
    pub cluster: Option<String>,
    pub period: Period,
    #[serde(default)]
    pub budget: Decimal,
    #[serde(default)]
    pub actual: Decimal,
    /// Defaults to the budget when omitted.
    pub forecast: Option<Decimal>,
    pub currency: Option<Currency>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl NewLedgerRow {
    pub fn figures(&self) -> crate::errors::Result<LedgerFigures> {
        LedgerFigures::new(
            self.budget,
            self.actual,
            self.forecast.unwrap_or(self.budget),
        )
    }
}

/// The (year, cluster) a rollup, variance pass or certification covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerScope {
    pub year: i32,
    pub cluster: Option<String>,
}

impl LedgerScope {
    pub fn new(year: i32, cluster: Option<String>) -> Self {
        Self { year, cluster }
    }
}

/// Everything needed to find the quarter row a transaction lands on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarterQuery {
    pub year: i32,
    pub category: String,
    pub cluster: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    Any,
    Is(String),
    IsNot(String),
}

/// Predicate over ledger rows.
///
/// The year is always bound; every other term is optional and composes with
/// AND. A `None` cluster means "any cluster".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerFilter {
    pub year: i32,
    pub cluster: Option<String>,
    pub category: CategoryFilter,
    pub periods: Option<Vec<Period>>,
    pub contains_date: Option<NaiveDate>,
}

impl LedgerFilter {
    pub fn scope(scope: &LedgerScope) -> Self {
        Self {
            year: scope.year,
            cluster: scope.cluster.clone(),
            category: CategoryFilter::Any,
            periods: None,
            contains_date: None,
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = CategoryFilter::Is(category.into());
        self
    }

    pub fn excluding_category(mut self, category: impl Into<String>) -> Self {
        self.category = CategoryFilter::IsNot(category.into());
        self
    }

    pub fn periods(mut self, periods: &[Period]) -> Self {
        self.periods = Some(periods.to_vec());
        self
    }

    pub fn containing(mut self, date: NaiveDate) -> Self {
        self.contains_date = Some(date);
        self
    }

    /// In-memory evaluation of the predicate, matching what storage filters on.
    pub fn matches(&self, row: &LedgerRow) -> bool {
        if row.year != self.year {
            return false;
        }
        if let Some(cluster) = &self.cluster {
            if row.cluster.as_ref() != Some(cluster) {
                return false;
            }
        }
        match &self.category {
            CategoryFilter::Any => {}
            CategoryFilter::Is(c) if &row.category_name != c => return false,
            CategoryFilter::IsNot(c) if &row.category_name == c => return false,
            _ => {}
        }
        if let Some(periods) = &self.periods {
            if !periods.contains(&row.period) {
                return false;
            }
        }
        if let Some(date) = self.contains_date {
            if !row.covers(date) {
                return false;
            }
        }
        true
    }
}

impl From<&QuarterQuery> for LedgerFilter {
    fn from(query: &QuarterQuery) -> Self {
        LedgerFilter::scope(&LedgerScope::new(query.year, query.cluster.clone()))
            .category(query.category.clone())
            .periods(&Period::QUARTERS)
    }
}
