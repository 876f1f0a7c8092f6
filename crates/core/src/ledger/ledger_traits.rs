use async_trait::async_trait;

use super::ledger_model::{
    CertificationStatus, LedgerFigures, LedgerFilter, LedgerRow, LedgerScope, NewLedgerRow,
    QuarterQuery,
};
use super::quarter_resolver::QuarterSource;
use crate::errors::Result;
use crate::imports::ImportOutcome;
use crate::settings::QuarterFallback;
use crate::transactions::{AppliedTransaction, NewTransactionRecord, RecordSnapshot};

/// Reads and writes available inside one open storage transaction.
///
/// Every call made through one instance commits or rolls back together.
pub trait LedgerTransaction: QuarterSource {
    fn get_row(&mut self, id: &str) -> Result<LedgerRow>;

    fn load_rows(&mut self, filter: &LedgerFilter) -> Result<Vec<LedgerRow>>;

    fn update_figures(&mut self, id: &str, figures: &LedgerFigures) -> Result<()>;

    /// Returns the number of rows touched.
    fn set_certification(&mut self, scope: &LedgerScope, status: CertificationStatus)
        -> Result<usize>;

    /// Inserts a transaction record and returns its id.
    fn insert_record(&mut self, record: &NewTransactionRecord) -> Result<String>;

    /// Stores the ledger link and snapshot figures on a record.
    fn sync_record(&mut self, record_id: &str, snapshot: &RecordSnapshot) -> Result<()>;

    /// Opens a nested savepoint inside the running transaction.
    fn savepoint(&mut self) -> Result<()>;

    /// Keeps the writes made since the innermost open savepoint.
    fn release_savepoint(&mut self) -> Result<()>;

    /// Discards the writes made since the innermost open savepoint and
    /// closes it.
    fn rollback_to_savepoint(&mut self) -> Result<()>;
}

/// Work to run inside one storage transaction.
pub type LedgerJob<T> = Box<dyn FnOnce(&mut dyn LedgerTransaction) -> Result<T> + Send + 'static>;

/// Runs ledger jobs atomically. An `Err` from the job rolls back every
/// write it made.
#[async_trait]
pub trait LedgerUnitOfWork: Send + Sync {
    async fn run_submission(&self, job: LedgerJob<AppliedTransaction>)
        -> Result<AppliedTransaction>;

    async fn run_import(&self, job: LedgerJob<ImportOutcome>) -> Result<ImportOutcome>;
}

/// Trait defining the contract for ledger row reads and administration.
#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    fn get_row(&self, id: &str) -> Result<LedgerRow>;

    fn list_rows(&self, scope: &LedgerScope) -> Result<Vec<LedgerRow>>;

    /// Read-only quarter resolution outside any write transaction.
    fn find_quarter(&self, query: &QuarterQuery, fallback: QuarterFallback) -> Result<LedgerRow>;

    async fn insert_rows(&self, rows: Vec<NewLedgerRow>) -> Result<Vec<LedgerRow>>;

    async fn set_certification(
        &self,
        scope: LedgerScope,
        status: CertificationStatus,
    ) -> Result<usize>;
}
