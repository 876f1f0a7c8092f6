use std::sync::Arc;

use async_trait::async_trait;
use chrono::Datelike;

use super::transactions_model::{
    BudgetCheck, BudgetCheckRequest, PendingTransaction, SubmissionResult, TransactionRecord,
    TransactionSource, TransactionSubmission,
};
use super::transactions_traits::{TransactionRepositoryTrait, TransactionServiceTrait};
use super::transactions_validation::{entry_amount, parse_entry_date, validate_submission};
use crate::categories::normalize_category;
use crate::context::RequestContext;
use crate::errors::{Error, ResolutionError, Result, ValidationError};
use crate::fx::{Currency, CurrencyConverter, FxServiceTrait};
use crate::ledger::{
    LedgerAggregator, LedgerRepositoryTrait, LedgerScope, LedgerTransaction, LedgerUnitOfWork,
    QuarterQuery,
};
use crate::settings::LedgerSettings;

pub struct TransactionService {
    unit_of_work: Arc<dyn LedgerUnitOfWork>,
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    record_repository: Arc<dyn TransactionRepositoryTrait>,
    fx_service: Arc<dyn FxServiceTrait>,
    settings: LedgerSettings,
}

impl TransactionService {
    pub fn new(
        unit_of_work: Arc<dyn LedgerUnitOfWork>,
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
        record_repository: Arc<dyn TransactionRepositoryTrait>,
        fx_service: Arc<dyn FxServiceTrait>,
        settings: LedgerSettings,
    ) -> Self {
        Self {
            unit_of_work,
            ledger_repository,
            record_repository,
            fx_service,
            settings,
        }
    }
}

#[async_trait]
impl TransactionServiceTrait for TransactionService {
    async fn submit(
        &self,
        ctx: &RequestContext,
        submission: TransactionSubmission,
    ) -> Result<SubmissionResult> {
        let (entry, custom_rates) = validate_submission(&submission)?;
        let rates = self.fx_service.effective_rates(ctx.cluster(), &custom_rates)?;

        let pending = PendingTransaction {
            year: entry.entry_date.year(),
            entry,
            amount_currency: Currency::Etb,
            rates,
            context: ctx.clone(),
            source: TransactionSource::Entry,
        };

        let aggregator = LedgerAggregator::new(self.settings);
        let applied = self
            .unit_of_work
            .run_submission(Box::new(move |tx: &mut dyn LedgerTransaction| {
                aggregator.apply(tx, &pending)
            }))
            .await
            .inspect_err(|e| log::warn!("Transaction submission failed: {}", e))?;

        Ok(SubmissionResult::from(applied))
    }

    fn check_budget(
        &self,
        ctx: &RequestContext,
        request: &BudgetCheckRequest,
    ) -> Result<BudgetCheck> {
        let mut invalid = Vec::new();
        let category = request
            .budget_heading
            .as_deref()
            .map(normalize_category)
            .filter(|c| !c.is_empty());
        if category.is_none() {
            invalid.push("Budget Heading".to_string());
        }
        let date = request.entry_date.as_deref().and_then(parse_entry_date);
        if date.is_none() {
            invalid.push("Date".to_string());
        }
        let amount = request.amount.as_deref().and_then(entry_amount);
        if amount.is_none() {
            invalid.push("Amount".to_string());
        }

        let (Some(category), Some(date), Some(amount)) = (category, date, amount) else {
            return Err(ValidationError::InvalidFields(invalid).into());
        };

        let query = QuarterQuery {
            year: request.year.unwrap_or_else(|| date.year()),
            category,
            cluster: ctx.cluster.clone(),
            date,
        };
        let row = self
            .ledger_repository
            .find_quarter(&query, self.settings.quarter_fallback)
            .map_err(|e| match e {
                Error::Resolution(ResolutionError::QuarterNotFound { .. }) => {
                    ResolutionError::NoBudgetData.into()
                }
                other => other,
            })?;

        let rates = self
            .fx_service
            .effective_rates(ctx.cluster(), &request.custom_rates())?;
        let converter = CurrencyConverter::new(rates.rates);

        let budget_available = row.figures.available();
        Ok(BudgetCheck {
            budget_available,
            budget_available_etb: converter.convert_amount(
                budget_available,
                row.currency,
                Currency::Etb,
            )?,
            entered_amount: converter.convert_amount(amount, Currency::Etb, row.currency)?,
            entered_amount_etb: amount,
            currency: row.currency,
            quarter: row.period,
            rates_used: rates.rates,
        })
    }

    fn list_records(&self, scope: &LedgerScope) -> Result<Vec<TransactionRecord>> {
        self.record_repository.list_records(scope)
    }
}
