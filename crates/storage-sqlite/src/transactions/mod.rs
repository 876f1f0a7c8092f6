//! Stored transaction records.

pub(crate) mod model;
mod repository;

pub use model::{RecordRatesDB, TransactionRecordDB};
pub use repository::TransactionRecordRepository;
