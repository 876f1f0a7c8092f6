use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use budgetledger_core::imports::ImportOutcome;
use budgetledger_core::ledger::{
    resolve_quarter, CertificationStatus, LedgerFilter, LedgerJob, LedgerRepositoryTrait,
    LedgerRow, LedgerScope, LedgerUnitOfWork, NewLedgerRow, QuarterQuery,
};
use budgetledger_core::settings::QuarterFallback;
use budgetledger_core::transactions::AppliedTransaction;
use budgetledger_core::Result;

use super::model::NewLedgerRowDB;
use super::transaction::{self, SqliteLedgerTransaction};
use crate::db::{get_connection, DbPool, StorageCapabilities, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::ledger_rows;

/// Ledger rows in SQLite. Writes, including whole submission and import
/// jobs, go through the single writer.
pub struct LedgerRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
    capabilities: StorageCapabilities,
}

impl LedgerRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle, capabilities: StorageCapabilities) -> Self {
        LedgerRepository {
            pool,
            writer,
            capabilities,
        }
    }

    async fn run_job<T>(&self, job: LedgerJob<T>) -> Result<T>
    where
        T: Send + 'static,
    {
        let capabilities = self.capabilities;
        self.writer
            .exec(move |conn| {
                let mut tx = SqliteLedgerTransaction::new(conn, capabilities);
                job(&mut tx)
            })
            .await
    }
}

#[async_trait]
impl LedgerUnitOfWork for LedgerRepository {
    async fn run_submission(&self, job: LedgerJob<AppliedTransaction>) -> Result<AppliedTransaction> {
        self.run_job(job).await
    }

    async fn run_import(&self, job: LedgerJob<ImportOutcome>) -> Result<ImportOutcome> {
        self.run_job(job).await
    }
}

#[async_trait]
impl LedgerRepositoryTrait for LedgerRepository {
    fn get_row(&self, id: &str) -> Result<LedgerRow> {
        let mut conn = get_connection(&self.pool)?;
        transaction::get_row(&mut conn, id)
    }

    fn list_rows(&self, scope: &LedgerScope) -> Result<Vec<LedgerRow>> {
        let mut conn = get_connection(&self.pool)?;
        transaction::load_rows(&mut conn, &LedgerFilter::scope(scope))
    }

    fn find_quarter(&self, query: &QuarterQuery, fallback: QuarterFallback) -> Result<LedgerRow> {
        let mut conn = get_connection(&self.pool)?;
        let mut reader = SqliteLedgerTransaction::new(&mut conn, self.capabilities);
        resolve_quarter(&mut reader, query, fallback)
    }

    async fn insert_rows(&self, rows: Vec<NewLedgerRow>) -> Result<Vec<LedgerRow>> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().naive_utc();
                let mut inserted = Vec::with_capacity(rows.len());
                for row in &rows {
                    transaction::ensure_no_overlap(&mut *conn, row)?;
                    let id = Uuid::new_v4().to_string();
                    diesel::insert_into(ledger_rows::table)
                        .values(&NewLedgerRowDB::from_domain(row, id.clone(), now)?)
                        .execute(&mut *conn)
                        .into_core()?;
                    inserted.push(transaction::get_row(&mut *conn, &id)?);
                }
                log::debug!("Inserted {} ledger rows", inserted.len());
                Ok(inserted)
            })
            .await
    }

    async fn set_certification(&self, scope: LedgerScope, status: CertificationStatus) -> Result<usize> {
        self.writer
            .exec(move |conn| transaction::set_certification(conn, &scope, status))
            .await
    }
}
