//! Ledger rows and the write-transaction view used by ledger jobs.

mod model;
mod repository;
mod transaction;

pub use model::{LedgerRowDB, NewLedgerRowDB};
pub use repository::LedgerRepository;
pub use transaction::SqliteLedgerTransaction;
