use rust_decimal::Decimal;

use super::transactions_model::{NewTransactionRecord, PendingTransaction, RecordSnapshot};
use crate::errors::{Result, ValidationError};
use crate::ledger::{LedgerRow, LedgerTransaction};

/// Persists transaction records and keeps them linked to the ledger.
///
/// Runs on the caller's open [`LedgerTransaction`], so a record never
/// outlives a rolled-back ledger update.
pub struct TransactionRecorder;

impl TransactionRecorder {
    pub fn build_record(
        pending: &PendingTransaction,
        ledger_row: Option<&LedgerRow>,
        converted_amount: Decimal,
    ) -> Result<NewTransactionRecord> {
        let entry = &pending.entry;
        let amount_etb = entry
            .amount
            .checked_mul(pending.rates.rates.to_etb(pending.amount_currency))
            .ok_or_else(|| {
                ValidationError::AmountOutOfRange(format!(
                    "ETB value of {} {} exceeds the supported range",
                    entry.amount, pending.amount_currency
                ))
            })?;
        Ok(NewTransactionRecord {
            budget_heading: entry.budget_heading.clone(),
            category_name: entry.category.clone(),
            outcome: entry.outcome.clone(),
            activity: entry.activity.clone(),
            budget_line: entry.budget_line.clone(),
            description: entry.description.clone(),
            partner: entry.partner.clone(),
            entry_date: entry.entry_date,
            amount: converted_amount,
            amount_etb,
            currency: ledger_row
                .map(|r| r.currency)
                .unwrap_or(pending.amount_currency),
            pv_number: entry.pv_number.clone(),
            period: ledger_row.map(|r| r.period),
            year: pending.year,
            cluster: pending.context.cluster.clone(),
            user_id: pending.context.user_id.clone(),
            source: pending.source,
            ledger_row_id: ledger_row.map(|r| r.id.clone()),
            custom_rate_applied: pending.rates.custom_applied,
            custom_rates: pending.rates.custom.clone(),
        })
    }

    /// Inserts the record and returns its id.
    pub fn record(tx: &mut dyn LedgerTransaction, record: &NewTransactionRecord) -> Result<String> {
        let id = tx.insert_record(record)?;
        log::debug!(
            "Recorded transaction {} ({} {}, {})",
            id,
            record.amount,
            record.currency,
            record.category_name
        );
        Ok(id)
    }

    /// Copies the ledger row's figures onto the record.
    pub fn sync(tx: &mut dyn LedgerTransaction, record_id: &str, row: &LedgerRow) -> Result<()> {
        tx.sync_record(record_id, &RecordSnapshot::from(row))
    }
}
