//! The ledger operations available to a job running on the writer.

use chrono::Utc;
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};
use uuid::Uuid;

use budgetledger_core::errors::{DatabaseError, Result, ValidationError};
use budgetledger_core::ledger::{
    CategoryFilter, CertificationStatus, LedgerFigures, LedgerFilter, LedgerRow, LedgerScope,
    LedgerTransaction, NewLedgerRow, Period, QuarterQuery, QuarterSource,
};
use budgetledger_core::transactions::{NewTransactionRecord, RecordSnapshot};

use super::model::{LedgerFiguresChangeset, LedgerRowDB};
use crate::db::StorageCapabilities;
use crate::errors::IntoCore;
use crate::schema::{ledger_rows, transaction_records};
use crate::transactions::model::{RecordRatesDB, RecordSnapshotChangeset, TransactionRecordDB};
use crate::utils::chunk_for_sqlite;

/// Builds the SQL form of a [`LedgerFilter`].
pub(crate) fn filtered_rows(filter: &LedgerFilter) -> ledger_rows::BoxedQuery<'static, Sqlite> {
    let mut query = ledger_rows::table
        .filter(ledger_rows::year.eq(filter.year))
        .into_boxed();

    if let Some(cluster) = &filter.cluster {
        query = query.filter(ledger_rows::cluster.eq(cluster.clone()));
    }
    match &filter.category {
        CategoryFilter::Any => {}
        CategoryFilter::Is(c) => query = query.filter(ledger_rows::category_name.eq(c.clone())),
        CategoryFilter::IsNot(c) => query = query.filter(ledger_rows::category_name.ne(c.clone())),
    }
    if let Some(periods) = &filter.periods {
        let names: Vec<String> = periods.iter().map(|p| p.as_str().to_string()).collect();
        query = query.filter(ledger_rows::period.eq_any(names));
    }
    if let Some(date) = filter.contains_date {
        query = query
            .filter(ledger_rows::start_date.le(date))
            .filter(ledger_rows::end_date.ge(date));
    }
    query
}

pub(crate) fn load_rows(conn: &mut SqliteConnection, filter: &LedgerFilter) -> Result<Vec<LedgerRow>> {
    filtered_rows(filter)
        .order((
            ledger_rows::category_name.asc(),
            ledger_rows::start_date.asc(),
            ledger_rows::period.asc(),
        ))
        .select(LedgerRowDB::as_select())
        .load::<LedgerRowDB>(conn)
        .into_core()?
        .into_iter()
        .map(LedgerRowDB::into_domain)
        .collect()
}

fn rows_by_start(conn: &mut SqliteConnection, filter: &LedgerFilter) -> Result<Vec<LedgerRow>> {
    filtered_rows(filter)
        .order((ledger_rows::start_date.asc(), ledger_rows::id.asc()))
        .select(LedgerRowDB::as_select())
        .load::<LedgerRowDB>(conn)
        .into_core()?
        .into_iter()
        .map(LedgerRowDB::into_domain)
        .collect()
}

fn first_row(conn: &mut SqliteConnection, filter: &LedgerFilter) -> Result<Option<LedgerRow>> {
    filtered_rows(filter)
        .order((ledger_rows::start_date.asc(), ledger_rows::id.asc()))
        .select(LedgerRowDB::as_select())
        .first::<LedgerRowDB>(conn)
        .optional()
        .into_core()?
        .map(LedgerRowDB::into_domain)
        .transpose()
}

/// Fails when a stored quarter row of the same year, category and cluster
/// shares a date with `row`'s range.
pub(crate) fn ensure_no_overlap(conn: &mut SqliteConnection, row: &NewLedgerRow) -> Result<()> {
    let (Some(start), Some(end)) = (row.start_date, row.end_date) else {
        return Ok(());
    };
    if !row.period.is_quarter() {
        return Ok(());
    }

    let quarters: Vec<String> = Period::QUARTERS.iter().map(|p| p.as_str().to_string()).collect();
    let mut query = ledger_rows::table
        .filter(ledger_rows::year.eq(row.year))
        .filter(ledger_rows::category_name.eq(row.category_name.trim().to_string()))
        .filter(ledger_rows::period.eq_any(quarters))
        .filter(ledger_rows::start_date.le(end))
        .filter(ledger_rows::end_date.ge(start))
        .into_boxed();
    query = match &row.cluster {
        Some(cluster) => query.filter(ledger_rows::cluster.eq(cluster.clone())),
        None => query.filter(ledger_rows::cluster.is_null()),
    };

    let existing = query
        .select(ledger_rows::period)
        .first::<String>(conn)
        .optional()
        .into_core()?;
    match existing {
        Some(period) => Err(ValidationError::OverlappingQuarters(format!(
            "{} {} {} overlaps the stored {} range",
            row.year,
            row.category_name.trim(),
            row.period,
            period
        ))
        .into()),
        None => Ok(()),
    }
}

pub(crate) fn get_row(conn: &mut SqliteConnection, id: &str) -> Result<LedgerRow> {
    ledger_rows::table
        .find(id)
        .select(LedgerRowDB::as_select())
        .first::<LedgerRowDB>(conn)
        .optional()
        .into_core()?
        .ok_or_else(|| DatabaseError::NotFound(format!("Ledger row {}", id)))?
        .into_domain()
}

/// [`LedgerTransaction`] over one connection. Jobs get one bound to the
/// writer's open immediate transaction; plain reads wrap a pooled connection.
pub struct SqliteLedgerTransaction<'c> {
    conn: &'c mut SqliteConnection,
    capabilities: StorageCapabilities,
}

impl<'c> SqliteLedgerTransaction<'c> {
    pub fn new(conn: &'c mut SqliteConnection, capabilities: StorageCapabilities) -> Self {
        Self { conn, capabilities }
    }
}

impl QuarterSource for SqliteLedgerTransaction<'_> {
    fn quarters_containing(&mut self, query: &QuarterQuery) -> Result<Vec<LedgerRow>> {
        rows_by_start(self.conn, &LedgerFilter::from(query).containing(query.date))
    }

    fn quarter_by_period(&mut self, query: &QuarterQuery, period: Period) -> Result<Option<LedgerRow>> {
        first_row(self.conn, &LedgerFilter::from(query).periods(&[period]))
    }
}

impl LedgerTransaction for SqliteLedgerTransaction<'_> {
    fn get_row(&mut self, id: &str) -> Result<LedgerRow> {
        get_row(self.conn, id)
    }

    fn load_rows(&mut self, filter: &LedgerFilter) -> Result<Vec<LedgerRow>> {
        load_rows(self.conn, filter)
    }

    fn update_figures(&mut self, id: &str, figures: &LedgerFigures) -> Result<()> {
        let changeset = LedgerFiguresChangeset::new(figures, Utc::now().naive_utc());
        let updated = diesel::update(ledger_rows::table.find(id))
            .set(&changeset)
            .execute(&mut *self.conn)
            .into_core()?;
        if updated == 0 {
            return Err(DatabaseError::NotFound(format!("Ledger row {}", id)).into());
        }
        Ok(())
    }

    fn set_certification(&mut self, scope: &LedgerScope, status: CertificationStatus) -> Result<usize> {
        set_certification(self.conn, scope, status)
    }

    fn insert_record(&mut self, record: &NewTransactionRecord) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let row = TransactionRecordDB::from_new(record, id.clone(), Utc::now().naive_utc());
        diesel::insert_into(transaction_records::table)
            .values(&row)
            .execute(&mut *self.conn)
            .into_core()?;

        if self.capabilities.record_rates {
            diesel::update(transaction_records::table.find(&id))
                .set(&RecordRatesDB::from_new(record))
                .execute(&mut *self.conn)
                .into_core()?;
        }
        Ok(id)
    }

    fn sync_record(&mut self, record_id: &str, snapshot: &RecordSnapshot) -> Result<()> {
        let updated = diesel::update(transaction_records::table.find(record_id))
            .set(&RecordSnapshotChangeset::from(snapshot))
            .execute(&mut *self.conn)
            .into_core()?;
        if updated == 0 {
            return Err(DatabaseError::NotFound(format!("Transaction record {}", record_id)).into());
        }
        Ok(())
    }

    fn savepoint(&mut self) -> Result<()> {
        AnsiTransactionManager::begin_transaction(&mut *self.conn).into_core()
    }

    fn release_savepoint(&mut self) -> Result<()> {
        AnsiTransactionManager::commit_transaction(&mut *self.conn).into_core()
    }

    fn rollback_to_savepoint(&mut self) -> Result<()> {
        AnsiTransactionManager::rollback_transaction(&mut *self.conn).into_core()
    }
}

pub(crate) fn set_certification(
    conn: &mut SqliteConnection,
    scope: &LedgerScope,
    status: CertificationStatus,
) -> Result<usize> {
    let ids: Vec<String> = filtered_rows(&LedgerFilter::scope(scope))
        .select(ledger_rows::id)
        .load::<String>(&mut *conn)
        .into_core()?;

    let now = Utc::now().naive_utc();
    let mut touched = 0;
    for chunk in chunk_for_sqlite(&ids) {
        touched += diesel::update(ledger_rows::table.filter(ledger_rows::id.eq_any(chunk)))
            .set((
                ledger_rows::certified.eq(status.as_str()),
                ledger_rows::updated_at.eq(now),
            ))
            .execute(&mut *conn)
            .into_core()?;
    }
    Ok(touched)
}
