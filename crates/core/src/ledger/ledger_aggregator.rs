//! Applies one transaction to the ledger and rolls the change up.
//!
//! The steps run in a fixed order on a single [`LedgerTransaction`]:
//!
//! 1. resolve the quarter row, convert the amount and record the transaction
//! 2. add the spend to the quarter row
//! 3. recompute the category's Annual Total row from its four quarters
//! 4. recompute the Total row from every category's Annual Total
//! 5. recompute actual+forecast and variance for every row in scope
//! 6. mark the scope uncertified
//! 7. copy the quarter row's figures onto the transaction record
//!
//! Any error leaves the run in [`AggregationState::RolledBack`]; the caller's
//! unit of work discards every write.

use rust_decimal::Decimal;

use super::ledger_calculations::{apply_spend, rollup};
use super::ledger_model::{CertificationStatus, LedgerFilter, LedgerRow, LedgerScope, Period, QuarterQuery};
use super::ledger_traits::LedgerTransaction;
use super::quarter_resolver::resolve_quarter;
use crate::constants::GRAND_TOTAL;
use crate::errors::Result;
use crate::fx::CurrencyConverter;
use crate::settings::LedgerSettings;
use crate::transactions::{AppliedTransaction, PendingTransaction, TransactionRecorder};

/// Data carried between steps once the quarter is known.
#[derive(Debug, Clone)]
pub struct Progress {
    pub quarter: LedgerRow,
    pub record_id: String,
    pub converted: Decimal,
}

impl Progress {
    fn scope(&self) -> LedgerScope {
        self.quarter.scope()
    }
}

#[derive(Debug, Clone)]
pub enum AggregationState {
    Validated,
    QuarterResolved(Progress),
    QuarterUpdated(Progress),
    AnnualRecomputed(Progress),
    TotalRecomputed(Progress),
    VarianceRecomputed(Progress),
    Uncertified(Progress),
    Done(Box<AppliedTransaction>),
    RolledBack,
}

impl AggregationState {
    pub fn name(&self) -> &'static str {
        match self {
            AggregationState::Validated => "Validated",
            AggregationState::QuarterResolved(_) => "QuarterResolved",
            AggregationState::QuarterUpdated(_) => "QuarterUpdated",
            AggregationState::AnnualRecomputed(_) => "AnnualRecomputed",
            AggregationState::TotalRecomputed(_) => "TotalRecomputed",
            AggregationState::VarianceRecomputed(_) => "VarianceRecomputed",
            AggregationState::Uncertified(_) => "Uncertified",
            AggregationState::Done(_) => "Done",
            AggregationState::RolledBack => "RolledBack",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerAggregator {
    settings: LedgerSettings,
}

impl LedgerAggregator {
    pub fn new(settings: LedgerSettings) -> Self {
        Self { settings }
    }

    /// Runs every step for `pending`. Must be called inside one storage
    /// transaction.
    pub fn apply(
        &self,
        tx: &mut dyn LedgerTransaction,
        pending: &PendingTransaction,
    ) -> Result<AppliedTransaction> {
        let mut state = AggregationState::Validated;
        loop {
            let current = state.name();
            state = match self.advance(tx, pending, state) {
                Ok(AggregationState::Done(applied)) => {
                    log::info!(
                        "Applied {} {} to ledger row {} ({} {}, year {}, cluster {})",
                        applied.amount_converted,
                        applied.ledger_row.currency,
                        applied.ledger_row.id,
                        applied.ledger_row.category_name,
                        applied.ledger_row.period,
                        applied.ledger_row.year,
                        applied.ledger_row.cluster.as_deref().unwrap_or("-"),
                    );
                    return Ok(*applied);
                }
                Ok(next) => next,
                Err(e) => {
                    log::debug!(
                        "Ledger update failed after {}: {}, moving to {}",
                        current,
                        e,
                        AggregationState::RolledBack.name()
                    );
                    return Err(e);
                }
            };
        }
    }

    fn advance(
        &self,
        tx: &mut dyn LedgerTransaction,
        pending: &PendingTransaction,
        state: AggregationState,
    ) -> Result<AggregationState> {
        match state {
            AggregationState::Validated => self.resolve(tx, pending).map(AggregationState::QuarterResolved),
            AggregationState::QuarterResolved(progress) => {
                self.update_quarter(tx, progress).map(AggregationState::QuarterUpdated)
            }
            AggregationState::QuarterUpdated(progress) => {
                recompute_annual(tx, &progress)?;
                Ok(AggregationState::AnnualRecomputed(progress))
            }
            AggregationState::AnnualRecomputed(progress) => {
                recompute_total(tx, &progress.scope())?;
                Ok(AggregationState::TotalRecomputed(progress))
            }
            AggregationState::TotalRecomputed(progress) => {
                recompute_derived(tx, &progress.scope())?;
                Ok(AggregationState::VarianceRecomputed(progress))
            }
            AggregationState::VarianceRecomputed(progress) => {
                tx.set_certification(&progress.scope(), CertificationStatus::Uncertified)?;
                Ok(AggregationState::Uncertified(progress))
            }
            AggregationState::Uncertified(progress) => {
                let row = tx.get_row(&progress.quarter.id)?;
                TransactionRecorder::sync(tx, &progress.record_id, &row)?;
                Ok(AggregationState::Done(Box::new(AppliedTransaction {
                    record_id: progress.record_id,
                    ledger_row: row,
                    amount_entered: pending.entry.amount,
                    amount_currency: pending.amount_currency,
                    amount_converted: progress.converted,
                    rates: pending.rates.clone(),
                })))
            }
            done @ (AggregationState::Done(_) | AggregationState::RolledBack) => Ok(done),
        }
    }

    fn resolve(&self, tx: &mut dyn LedgerTransaction, pending: &PendingTransaction) -> Result<Progress> {
        let query = QuarterQuery {
            year: pending.year,
            category: pending.entry.category.clone(),
            cluster: pending.context.cluster.clone(),
            date: pending.entry.entry_date,
        };
        let quarter = resolve_quarter(tx, &query, self.settings.quarter_fallback)?;

        let converted = CurrencyConverter::new(pending.rates.rates).convert_amount(
            pending.entry.amount,
            pending.amount_currency,
            quarter.currency,
        )?;

        let record = TransactionRecorder::build_record(pending, Some(&quarter), converted)?;
        let record_id = TransactionRecorder::record(tx, &record)?;

        Ok(Progress {
            quarter,
            record_id,
            converted,
        })
    }

    fn update_quarter(&self, tx: &mut dyn LedgerTransaction, mut progress: Progress) -> Result<Progress> {
        let figures = apply_spend(
            &progress.quarter.figures,
            progress.converted,
            self.settings.forecast_rule,
        )?;
        tx.update_figures(&progress.quarter.id, &figures)?;
        progress.quarter.figures = figures;
        Ok(progress)
    }
}

fn recompute_annual(tx: &mut dyn LedgerTransaction, progress: &Progress) -> Result<()> {
    let scope = progress.scope();
    let category = progress.quarter.category_name.clone();

    let quarters = tx.load_rows(
        &LedgerFilter::scope(&scope)
            .category(category.clone())
            .periods(&Period::QUARTERS),
    )?;
    let annual = tx.load_rows(
        &LedgerFilter::scope(&scope)
            .category(category.clone())
            .periods(&[Period::AnnualTotal]),
    )?;

    if annual.is_empty() {
        log::warn!(
            "No Annual Total row for '{}' in year {}, skipping rollup",
            category,
            scope.year
        );
    }

    let figures = rollup(quarters.iter().map(|r| &r.figures))?;
    for row in annual {
        tx.update_figures(&row.id, &figures)?;
    }
    Ok(())
}

fn recompute_total(tx: &mut dyn LedgerTransaction, scope: &LedgerScope) -> Result<()> {
    let annuals = tx.load_rows(
        &LedgerFilter::scope(scope)
            .excluding_category(GRAND_TOTAL)
            .periods(&[Period::AnnualTotal]),
    )?;
    let totals = tx.load_rows(
        &LedgerFilter::scope(scope)
            .category(GRAND_TOTAL)
            .periods(&[Period::Total]),
    )?;

    if totals.is_empty() {
        log::warn!("No Total row for year {}, skipping rollup", scope.year);
    }

    let figures = rollup(annuals.iter().map(|r| &r.figures))?;
    for row in totals {
        tx.update_figures(&row.id, &figures)?;
    }
    Ok(())
}

/// Brings actual+forecast and variance of every row in scope in line with its
/// amounts. Rows already consistent are not rewritten.
fn recompute_derived(tx: &mut dyn LedgerTransaction, scope: &LedgerScope) -> Result<()> {
    let rows = tx.load_rows(&LedgerFilter::scope(scope))?;
    let mut touched = 0usize;
    for row in rows {
        let derived = row.figures.with_derived()?;
        if derived != row.figures {
            tx.update_figures(&row.id, &derived)?;
            touched += 1;
        }
    }
    log::debug!("Recomputed derived figures on {} rows in year {}", touched, scope.year);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::errors::{DatabaseError, Error, ValidationError};
    use crate::fx::{Currency, CustomRateRequest, EffectiveRates};
    use crate::ledger::test_support::InMemoryLedger;
    use crate::transactions::{TransactionEntry, TransactionSource};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn pending(category: &str, date: NaiveDate, amount: Decimal, cluster: &str) -> PendingTransaction {
        PendingTransaction {
            entry: TransactionEntry {
                budget_heading: format!("1. {}", category),
                category: category.to_string(),
                outcome: "Outcome".into(),
                activity: "Activity".into(),
                budget_line: "1.1".into(),
                description: "desc".into(),
                partner: "Partner".into(),
                entry_date: date,
                amount,
                pv_number: None,
            },
            year: 2024,
            amount_currency: Currency::Etb,
            rates: EffectiveRates::resolve(None, &CustomRateRequest::default()),
            context: RequestContext::new(Some("u1".into()), Some(cluster.into())),
            source: TransactionSource::Entry,
        }
    }

    fn may(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn applies_spend_and_rolls_up() {
        let mut ledger = InMemoryLedger::seeded("Gambella");
        ledger.set_quarter("Travel", Period::Q2, dec!(1000), dec!(200), dec!(800));

        let applied = LedgerAggregator::default()
            .apply(&mut ledger, &pending("Travel", may(2), dec!(300), "Gambella"))
            .unwrap();

        let q2 = &applied.ledger_row;
        assert_eq!(q2.period, Period::Q2);
        assert_eq!(q2.figures.actual, dec!(500));
        assert_eq!(q2.figures.forecast, dec!(500));
        assert_eq!(q2.figures.actual_plus_forecast, dec!(1000));
        assert_eq!(q2.figures.variance_percentage, dec!(50.00));

        ledger.assert_rollups_consistent();
        assert!(ledger
            .rows
            .iter()
            .all(|r| r.certified == CertificationStatus::Uncertified));

        let record = ledger.records.get(&applied.record_id).unwrap();
        let snapshot = record.1.as_ref().unwrap();
        assert_eq!(snapshot.ledger_row_id, q2.id);
        assert_eq!(snapshot.actual_spent, dec!(500));
        assert_eq!(snapshot.remaining_budget, dec!(500));
    }

    #[test]
    fn zero_budget_goes_negative_hundred() {
        let mut ledger = InMemoryLedger::seeded("Gambella");
        ledger.set_quarter("Travel", Period::Q2, dec!(0), dec!(0), dec!(0));

        let applied = LedgerAggregator::default()
            .apply(&mut ledger, &pending("Travel", may(2), dec!(100), "Gambella"))
            .unwrap();
        assert_eq!(applied.ledger_row.figures.actual, dec!(100));
        assert_eq!(applied.ledger_row.figures.variance_percentage, dec!(-100.00));
    }

    #[test]
    fn converts_into_ledger_currency() {
        let mut ledger = InMemoryLedger::seeded_in("Gambella", Currency::Usd);
        let applied = LedgerAggregator::default()
            .apply(&mut ledger, &pending("Travel", may(2), dec!(550), "Gambella"))
            .unwrap();
        assert_eq!(applied.amount_converted, dec!(10));
        assert_eq!(applied.ledger_row.currency, Currency::Usd);
        let (record, _) = ledger.records.get(&applied.record_id).unwrap();
        assert_eq!(record.amount_etb, dec!(550));
        assert_eq!(record.amount, dec!(10));
    }

    #[test]
    fn unresolved_quarter_writes_nothing() {
        let mut ledger = InMemoryLedger::seeded("Gambella");
        let before = ledger.rows.clone();
        let err = LedgerAggregator::default()
            .apply(&mut ledger, &pending("Catering", may(2), dec!(10), "Gambella"))
            .unwrap_err();
        assert!(matches!(err, Error::Resolution(_)));
        assert_eq!(ledger.rows, before);
        assert!(ledger.records.is_empty());
    }

    #[test]
    fn storage_failure_propagates() {
        let mut ledger = InMemoryLedger::seeded("Gambella");
        ledger.fail_certification = true;
        let err = LedgerAggregator::default()
            .apply(&mut ledger, &pending("Travel", may(2), dec!(10), "Gambella"))
            .unwrap_err();
        assert!(matches!(err, Error::Database(DatabaseError::QueryFailed(_))));
    }

    #[test]
    fn etb_value_past_decimal_range_writes_nothing() {
        let mut ledger = InMemoryLedger::seeded_in("Gambella", Currency::Usd);
        let before = ledger.rows.clone();
        let mut usd = pending("Travel", may(2), dec!(1000000000000), "Gambella");
        usd.amount_currency = Currency::Usd;
        usd.rates.rates.usd_to_etb = Decimal::MAX;

        let err = LedgerAggregator::default().apply(&mut ledger, &usd).unwrap_err();
        assert!(
            matches!(err, Error::Validation(ValidationError::AmountOutOfRange(_))),
            "{err:?}"
        );
        assert_eq!(ledger.rows, before);
        assert!(ledger.records.is_empty());
    }
}
