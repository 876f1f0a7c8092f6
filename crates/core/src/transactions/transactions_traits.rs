use async_trait::async_trait;

use super::transactions_model::{
    BudgetCheck, BudgetCheckRequest, SubmissionResult, TransactionRecord, TransactionSubmission,
};
use crate::context::RequestContext;
use crate::errors::Result;
use crate::ledger::LedgerScope;

/// Read access to stored transaction records.
pub trait TransactionRepositoryTrait: Send + Sync {
    fn get_record(&self, id: &str) -> Result<TransactionRecord>;

    /// Records of a year, newest first. A `None` cluster lists every cluster.
    fn list_records(&self, scope: &LedgerScope) -> Result<Vec<TransactionRecord>>;
}

#[async_trait]
pub trait TransactionServiceTrait: Send + Sync {
    /// Validates a form submission and applies it to the ledger atomically.
    async fn submit(
        &self,
        ctx: &RequestContext,
        submission: TransactionSubmission,
    ) -> Result<SubmissionResult>;

    /// Remaining budget for a heading and date. Writes nothing.
    fn check_budget(&self, ctx: &RequestContext, request: &BudgetCheckRequest)
        -> Result<BudgetCheck>;

    fn list_records(&self, scope: &LedgerScope) -> Result<Vec<TransactionRecord>>;
}
