//! Transactions module - submissions, records and budget checks.

mod transaction_recorder;
mod transactions_model;
mod transactions_service;
mod transactions_traits;
mod transactions_validation;

pub use transaction_recorder::TransactionRecorder;
pub use transactions_model::{
    AppliedTransaction, BudgetCheck, BudgetCheckRequest, NewTransactionRecord, PendingTransaction,
    RecordSnapshot, SubmissionResult, TransactionEntry, TransactionRecord, TransactionSource,
    TransactionSubmission,
};
pub use transactions_service::TransactionService;
pub use transactions_traits::{TransactionRepositoryTrait, TransactionServiceTrait};
pub use transactions_validation::{
    entry_amount, parse_amount, parse_entry_date, validate_submission, DATE_FORMAT,
};
