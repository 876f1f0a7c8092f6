//! Budget Ledger Core - Domain entities, services, and traits.
//!
//! This crate contains the business rules of the budget ledger: how an
//! expense entered against a budget heading is converted into the ledger's
//! currency, matched to its fiscal quarter, and rolled up through the
//! quarter, annual and grand total rows.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod categories;
pub mod constants;
pub mod context;
pub mod errors;
pub mod fx;
pub mod imports;
pub mod ledger;
pub mod settings;
pub mod transactions;

pub use context::RequestContext;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
