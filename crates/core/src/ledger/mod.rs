//! Ledger module - budget rows, quarter resolution and rollups.

mod ledger_aggregator;
mod ledger_calculations;
mod ledger_model;
mod ledger_service;
mod ledger_traits;
mod quarter_resolver;

#[cfg(test)]
pub(crate) mod test_support;

pub use ledger_aggregator::{AggregationState, LedgerAggregator, Progress};
pub use ledger_calculations::{apply_spend, rollup, variance_percentage};
pub use ledger_model::{
    CategoryFilter, CertificationStatus, LedgerFigures, LedgerFilter, LedgerRow, LedgerScope,
    NewLedgerRow, Period, QuarterQuery,
};
pub use ledger_service::{validate_seed_rows, LedgerService, LedgerServiceTrait};
pub use ledger_traits::{LedgerJob, LedgerRepositoryTrait, LedgerTransaction, LedgerUnitOfWork};
pub use quarter_resolver::{resolve_quarter, QuarterSource};
