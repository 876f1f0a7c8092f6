use std::sync::Arc;

use async_trait::async_trait;
use chrono::Datelike;

use super::import_model::{ImportOutcome, ImportRowError, ImportSummary, ImportedRow};
use super::import_parser::{parse_rows, ImportRow};
use super::sheet_reader::{read_rows, SheetFormat};
use crate::context::RequestContext;
use crate::errors::{Result, ValidationError};
use crate::fx::{ClusterCurrencyConfig, EffectiveRates, FxServiceTrait};
use crate::ledger::{LedgerAggregator, LedgerTransaction, LedgerUnitOfWork};
use crate::settings::LedgerSettings;
use crate::transactions::{PendingTransaction, TransactionSource};

#[async_trait]
pub trait ImportServiceTrait: Send + Sync {
    /// Imports every valid row of an uploaded sheet in one storage
    /// transaction. Bad rows are reported and skipped.
    async fn import_file(
        &self,
        ctx: &RequestContext,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ImportSummary>;
}

pub struct ImportService {
    unit_of_work: Arc<dyn LedgerUnitOfWork>,
    fx_service: Arc<dyn FxServiceTrait>,
    settings: LedgerSettings,
}

impl ImportService {
    pub fn new(
        unit_of_work: Arc<dyn LedgerUnitOfWork>,
        fx_service: Arc<dyn FxServiceTrait>,
        settings: LedgerSettings,
    ) -> Self {
        Self {
            unit_of_work,
            fx_service,
            settings,
        }
    }
}

/// Applies each parsed row in turn, each under its own savepoint. Row-scoped
/// failures undo that row's writes and are collected; anything else aborts
/// the batch.
fn apply_rows(
    tx: &mut dyn LedgerTransaction,
    aggregator: &LedgerAggregator,
    ctx: &RequestContext,
    cluster_config: Option<&ClusterCurrencyConfig>,
    rows: Vec<std::result::Result<ImportRow, ImportRowError>>,
) -> Result<ImportOutcome> {
    let mut outcome = ImportOutcome::default();

    for parsed in rows {
        let row = match parsed {
            Ok(row) => row,
            Err(row_error) => {
                log::warn!("Skipping import row: {}", row_error);
                outcome.errors.push(row_error);
                continue;
            }
        };

        let pending = PendingTransaction {
            year: row.entry.entry_date.year(),
            amount_currency: row.currency,
            rates: EffectiveRates::resolve(cluster_config, &row.custom_rates),
            context: ctx.clone(),
            source: TransactionSource::Import,
            entry: row.entry,
        };

        tx.savepoint()?;
        let applied = aggregator.apply(tx, &pending);
        match &applied {
            Ok(_) => tx.release_savepoint()?,
            Err(e) if e.is_row_recoverable() => tx.rollback_to_savepoint()?,
            Err(_) => {}
        }

        match applied {
            Ok(applied) => outcome.imported.push(ImportedRow {
                row: row.row,
                transaction_id: applied.record_id,
                ledger_row_id: applied.ledger_row.id.clone(),
                category_name: applied.ledger_row.category_name.clone(),
                entry_date: pending.entry.entry_date,
                quarter: applied.ledger_row.period,
                amount: applied.amount_entered,
                amount_currency: applied.amount_currency,
                amount_converted: applied.amount_converted,
                ledger_currency: applied.ledger_row.currency,
                custom_rate_applied: applied.rates.custom_applied,
            }),
            Err(e) if e.is_row_recoverable() => {
                let row_error = ImportRowError::new(row.row, &e);
                log::warn!("Skipping import row: {}", row_error);
                outcome.errors.push(row_error);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(outcome)
}

#[async_trait]
impl ImportServiceTrait for ImportService {
    async fn import_file(
        &self,
        ctx: &RequestContext,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ImportSummary> {
        if bytes.is_empty() {
            return Err(ValidationError::InvalidInput("No file uploaded".to_string()).into());
        }
        if bytes.len() > self.settings.import_max_bytes {
            return Err(ValidationError::InvalidInput(format!(
                "File is too large. Maximum size is {} MB",
                self.settings.import_max_bytes / (1024 * 1024)
            ))
            .into());
        }

        let format = SheetFormat::from_file_name(file_name)?;
        let rows = parse_rows(&read_rows(&bytes, format)?)?;
        log::info!(
            "Importing {} data rows from {} ({:?})",
            rows.len(),
            file_name,
            format
        );

        let cluster_config = match ctx.cluster() {
            Some(cluster) => self.fx_service.get_cluster_config(cluster)?,
            None => None,
        };

        let aggregator = LedgerAggregator::new(self.settings);
        let job_ctx = ctx.clone();
        let outcome = self
            .unit_of_work
            .run_import(Box::new(move |tx: &mut dyn LedgerTransaction| {
                apply_rows(tx, &aggregator, &job_ctx, cluster_config.as_ref(), rows)
            }))
            .await
            .inspect_err(|e| log::error!("Import of {} rolled back: {}", file_name, e))?;

        let summary = ImportSummary::from(outcome);
        log::info!("{}", summary.message);
        Ok(summary)
    }
}
