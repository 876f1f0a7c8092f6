use diesel::prelude::*;
use std::sync::Arc;

use budgetledger_core::errors::DatabaseError;
use budgetledger_core::ledger::LedgerScope;
use budgetledger_core::transactions::{TransactionRecord, TransactionRepositoryTrait};
use budgetledger_core::Result;

use super::model::{RecordRatesDB, TransactionRecordDB};
use crate::db::{get_connection, DbConnection, DbPool, StorageCapabilities};
use crate::errors::IntoCore;
use crate::schema::transaction_records;

/// Read side of the transaction records. Inserts happen inside ledger jobs.
pub struct TransactionRecordRepository {
    pool: Arc<DbPool>,
    capabilities: StorageCapabilities,
}

impl TransactionRecordRepository {
    pub fn new(pool: Arc<DbPool>, capabilities: StorageCapabilities) -> Self {
        TransactionRecordRepository { pool, capabilities }
    }

    fn load(
        &self,
        conn: &mut DbConnection,
        query: transaction_records::BoxedQuery<'static, diesel::sqlite::Sqlite>,
    ) -> Result<Vec<TransactionRecord>> {
        if self.capabilities.record_rates {
            query
                .select((TransactionRecordDB::as_select(), RecordRatesDB::as_select()))
                .load::<(TransactionRecordDB, RecordRatesDB)>(conn)
                .into_core()?
                .into_iter()
                .map(|(record, rates)| record.into_domain(Some(rates)))
                .collect()
        } else {
            query
                .select(TransactionRecordDB::as_select())
                .load::<TransactionRecordDB>(conn)
                .into_core()?
                .into_iter()
                .map(|record| record.into_domain(None))
                .collect()
        }
    }
}

impl TransactionRepositoryTrait for TransactionRecordRepository {
    fn get_record(&self, id: &str) -> Result<TransactionRecord> {
        let mut conn = get_connection(&self.pool)?;
        let query = transaction_records::table
            .filter(transaction_records::id.eq(id.to_string()))
            .into_boxed();
        self.load(&mut conn, query)?
            .pop()
            .ok_or_else(|| DatabaseError::NotFound(format!("Transaction record {}", id)).into())
    }

    fn list_records(&self, scope: &LedgerScope) -> Result<Vec<TransactionRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = transaction_records::table
            .filter(transaction_records::year.eq(scope.year))
            .order((
                transaction_records::created_at.desc(),
                transaction_records::id.desc(),
            ))
            .into_boxed();
        if let Some(cluster) = &scope.cluster {
            query = query.filter(transaction_records::cluster.eq(cluster.clone()));
        }
        self.load(&mut conn, query)
    }
}
