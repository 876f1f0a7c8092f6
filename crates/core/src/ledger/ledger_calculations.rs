//! Arithmetic of the ledger rows. Pure functions, no storage.
//!
//! Every operation is checked. A figure that leaves the `Decimal` range is a
//! [`ValidationError::AmountOutOfRange`] for the entry that caused it.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::ledger_model::LedgerFigures;
use crate::constants::VARIANCE_DECIMAL_PRECISION;
use crate::errors::{Result, ValidationError};
use crate::settings::ForecastRule;

fn in_range(value: Option<Decimal>, figure: &str) -> Result<Decimal> {
    value.ok_or_else(|| {
        ValidationError::AmountOutOfRange(format!("{} exceeds the supported range", figure)).into()
    })
}

/// `round((budget - actual) / budget * 100, 2)` for a positive budget,
/// `-100.00` when nothing was budgeted but money was spent, `0.00` otherwise.
pub fn variance_percentage(budget: Decimal, actual: Decimal) -> Result<Decimal> {
    if budget > Decimal::ZERO {
        let remaining = in_range(budget.checked_sub(actual), "Variance")?;
        let ratio = in_range(remaining.checked_div(budget), "Variance")?;
        Ok(in_range(ratio.checked_mul(dec!(100)), "Variance")?.round_dp_with_strategy(
            VARIANCE_DECIMAL_PRECISION,
            RoundingStrategy::MidpointAwayFromZero,
        ))
    } else if budget.is_zero() && actual > Decimal::ZERO {
        Ok(dec!(-100.00))
    } else {
        Ok(dec!(0.00))
    }
}

/// `actual + forecast`.
pub fn actual_plus_forecast(actual: Decimal, forecast: Decimal) -> Result<Decimal> {
    in_range(actual.checked_add(forecast), "Actual plus forecast")
}

/// Applies a spend to a quarter's figures.
pub fn apply_spend(figures: &LedgerFigures, amount: Decimal, rule: ForecastRule) -> Result<LedgerFigures> {
    let actual = in_range(figures.actual.checked_add(amount), "Actual")?;
    let forecast = match rule {
        ForecastRule::Decrement => in_range(figures.forecast.checked_sub(amount), "Forecast")?,
        ForecastRule::RemainingBudget => in_range(figures.budget.checked_sub(actual), "Forecast")?,
    }
    .max(Decimal::ZERO);
    LedgerFigures::new(figures.budget, actual, forecast)
}

/// Sums budget, actual and forecast of `parts` into a rollup row's figures.
pub fn rollup<'a>(parts: impl IntoIterator<Item = &'a LedgerFigures>) -> Result<LedgerFigures> {
    let (budget, actual, forecast) = parts.into_iter().try_fold(
        (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
        |(b, a, f), part| -> Result<_> {
            Ok((
                in_range(b.checked_add(part.budget), "Budget total")?,
                in_range(a.checked_add(part.actual), "Actual total")?,
                in_range(f.checked_add(part.forecast), "Forecast total")?,
            ))
        },
    )?;
    LedgerFigures::new(budget, actual, forecast)
}
