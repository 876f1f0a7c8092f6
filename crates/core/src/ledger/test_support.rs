//! In-memory ledger used by the service tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{
    resolve_quarter, rollup, CertificationStatus, LedgerFigures, LedgerFilter, LedgerJob,
    LedgerRepositoryTrait, LedgerRow, LedgerScope, LedgerTransaction, LedgerUnitOfWork,
    NewLedgerRow, Period, QuarterQuery, QuarterSource,
};
use crate::constants::GRAND_TOTAL;
use crate::errors::{DatabaseError, Result};
use crate::fx::Currency;
use crate::imports::ImportOutcome;
use crate::settings::QuarterFallback;
use crate::transactions::{AppliedTransaction, NewTransactionRecord, RecordSnapshot};

pub const CATEGORIES: [&str; 2] = ["Travel", "Administrative costs"];

fn timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    pub rows: Vec<LedgerRow>,
    pub records: HashMap<String, (NewTransactionRecord, Option<RecordSnapshot>)>,
    pub fail_certification: bool,
    next_id: usize,
    savepoints: Vec<InMemoryLedger>,
}

impl InMemoryLedger {
    /// Two categories with calendar quarters in 2024, their Annual Total rows
    /// and a Total row, all certified.
    pub fn seeded(cluster: &str) -> Self {
        Self::seeded_in(cluster, Currency::Etb)
    }

    pub fn seeded_in(cluster: &str, currency: Currency) -> Self {
        let mut ledger = Self::default();
        let quarter_ranges = [
            (Period::Q1, (1, 1), (3, 31)),
            (Period::Q2, (4, 1), (6, 30)),
            (Period::Q3, (7, 1), (9, 30)),
            (Period::Q4, (10, 1), (12, 31)),
        ];
        for category in CATEGORIES {
            for (period, (sm, sd), (em, ed)) in quarter_ranges {
                ledger.push(
                    category,
                    cluster,
                    period,
                    currency,
                    LedgerFigures::new(dec!(1000), Decimal::ZERO, dec!(1000)).unwrap(),
                    NaiveDate::from_ymd_opt(2024, sm, sd),
                    NaiveDate::from_ymd_opt(2024, em, ed),
                );
            }
            ledger.push(
                category,
                cluster,
                Period::AnnualTotal,
                currency,
                LedgerFigures::new(dec!(4000), Decimal::ZERO, dec!(4000)).unwrap(),
                None,
                None,
            );
        }
        ledger.push(
            GRAND_TOTAL,
            cluster,
            Period::Total,
            currency,
            LedgerFigures::new(dec!(8000), Decimal::ZERO, dec!(8000)).unwrap(),
            None,
            None,
        );
        ledger
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        category: &str,
        cluster: &str,
        period: Period,
        currency: Currency,
        figures: LedgerFigures,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) {
        self.next_id += 1;
        self.rows.push(LedgerRow {
            id: format!("row-{}", self.next_id),
            year: 2024,
            category_name: category.to_string(),
            cluster: Some(cluster.to_string()),
            period,
            figures,
            currency,
            certified: CertificationStatus::Certified,
            start_date,
            end_date,
            created_at: timestamp(),
            updated_at: timestamp(),
        });
    }

    pub fn set_quarter(
        &mut self,
        category: &str,
        period: Period,
        budget: Decimal,
        actual: Decimal,
        forecast: Decimal,
    ) {
        for row in self
            .rows
            .iter_mut()
            .filter(|r| r.category_name == category && r.period == period)
        {
            row.figures = LedgerFigures::new(budget, actual, forecast).unwrap();
        }
    }

    pub fn savepoints_closed(&self) -> bool {
        self.savepoints.is_empty()
    }

    pub fn row(&self, category: &str, period: Period) -> &LedgerRow {
        self.rows
            .iter()
            .find(|r| r.category_name == category && r.period == period)
            .unwrap()
    }

    pub fn assert_rollups_consistent(&self) {
        for row in &self.rows {
            assert_eq!(
                row.figures.actual_plus_forecast,
                row.figures.actual + row.figures.forecast,
                "actual+forecast out of line on {}",
                row.id
            );
        }
        let mut annual_sum = Vec::new();
        for category in CATEGORIES {
            let quarters: Vec<_> = self
                .rows
                .iter()
                .filter(|r| r.category_name == category && r.period.is_quarter())
                .map(|r| r.figures)
                .collect();
            let expected = rollup(quarters.iter()).unwrap();
            let annual = self.row(category, Period::AnnualTotal);
            assert_eq!(annual.figures, expected, "annual rollup for {}", category);
            annual_sum.push(annual.figures);
        }
        assert_eq!(
            self.row(GRAND_TOTAL, Period::Total).figures,
            rollup(annual_sum.iter()).unwrap()
        );
    }
}

impl QuarterSource for InMemoryLedger {
    fn quarters_containing(&mut self, query: &QuarterQuery) -> Result<Vec<LedgerRow>> {
        let filter = LedgerFilter::from(query).containing(query.date);
        Ok(self.rows.iter().filter(|r| filter.matches(r)).cloned().collect())
    }

    fn quarter_by_period(&mut self, query: &QuarterQuery, period: Period) -> Result<Option<LedgerRow>> {
        let filter = LedgerFilter::from(query).periods(&[period]);
        Ok(self.rows.iter().find(|r| filter.matches(r)).cloned())
    }
}

impl LedgerTransaction for InMemoryLedger {
    fn get_row(&mut self, id: &str) -> Result<LedgerRow> {
        self.rows
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(id.to_string()).into())
    }

    fn load_rows(&mut self, filter: &LedgerFilter) -> Result<Vec<LedgerRow>> {
        Ok(self.rows.iter().filter(|r| filter.matches(r)).cloned().collect())
    }

    fn update_figures(&mut self, id: &str, figures: &LedgerFigures) -> Result<()> {
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| DatabaseError::NotFound(id.to_string()))?;
        row.figures = *figures;
        Ok(())
    }

    fn set_certification(&mut self, scope: &LedgerScope, status: CertificationStatus) -> Result<usize> {
        if self.fail_certification {
            return Err(DatabaseError::QueryFailed("database is locked".to_string()).into());
        }
        let filter = LedgerFilter::scope(scope);
        let mut count = 0;
        for row in self.rows.iter_mut().filter(|r| filter.matches(r)) {
            row.certified = status;
            count += 1;
        }
        Ok(count)
    }

    fn insert_record(&mut self, record: &NewTransactionRecord) -> Result<String> {
        self.next_id += 1;
        let id = format!("rec-{}", self.next_id);
        self.records.insert(id.clone(), (record.clone(), None));
        Ok(id)
    }

    fn sync_record(&mut self, record_id: &str, snapshot: &RecordSnapshot) -> Result<()> {
        let entry = self
            .records
            .get_mut(record_id)
            .ok_or_else(|| DatabaseError::NotFound(record_id.to_string()))?;
        entry.1 = Some(snapshot.clone());
        Ok(())
    }

    fn savepoint(&mut self) -> Result<()> {
        let state = self.clone();
        self.savepoints.push(state);
        Ok(())
    }

    fn release_savepoint(&mut self) -> Result<()> {
        self.savepoints
            .pop()
            .map(|_| ())
            .ok_or_else(|| DatabaseError::TransactionFailed("No open savepoint".to_string()).into())
    }

    fn rollback_to_savepoint(&mut self) -> Result<()> {
        let state = self
            .savepoints
            .pop()
            .ok_or_else(|| DatabaseError::TransactionFailed("No open savepoint".to_string()))?;
        *self = state;
        Ok(())
    }
}

/// Unit of work over an [`InMemoryLedger`] that restores the previous state
/// when a job fails.
#[derive(Default)]
pub struct InMemoryStore {
    pub ledger: Mutex<InMemoryLedger>,
}

impl InMemoryStore {
    pub fn new(ledger: InMemoryLedger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
        }
    }

    pub fn snapshot(&self) -> InMemoryLedger {
        self.ledger.lock().unwrap().clone()
    }

    fn run<T>(&self, job: LedgerJob<T>) -> Result<T> {
        let mut ledger = self.ledger.lock().unwrap();
        let mut working = ledger.clone();
        let result = job(&mut working);
        if result.is_ok() {
            *ledger = working;
        }
        result
    }
}

#[async_trait]
impl LedgerUnitOfWork for InMemoryStore {
    async fn run_submission(&self, job: LedgerJob<AppliedTransaction>) -> Result<AppliedTransaction> {
        self.run(job)
    }

    async fn run_import(&self, job: LedgerJob<ImportOutcome>) -> Result<ImportOutcome> {
        self.run(job)
    }
}

#[async_trait]
impl LedgerRepositoryTrait for InMemoryStore {
    fn get_row(&self, id: &str) -> Result<LedgerRow> {
        self.ledger.lock().unwrap().get_row(id)
    }

    fn list_rows(&self, scope: &LedgerScope) -> Result<Vec<LedgerRow>> {
        self.ledger.lock().unwrap().load_rows(&LedgerFilter::scope(scope))
    }

    fn find_quarter(&self, query: &QuarterQuery, fallback: QuarterFallback) -> Result<LedgerRow> {
        let mut ledger = self.ledger.lock().unwrap();
        resolve_quarter(&mut *ledger, query, fallback)
    }

    async fn insert_rows(&self, _rows: Vec<NewLedgerRow>) -> Result<Vec<LedgerRow>> {
        unimplemented!("seeding is covered by the storage tests")
    }

    async fn set_certification(&self, scope: LedgerScope, status: CertificationStatus) -> Result<usize> {
        self.ledger.lock().unwrap().set_certification(&scope, status)
    }
}
