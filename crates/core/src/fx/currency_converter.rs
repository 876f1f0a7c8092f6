use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::currency::Currency;
use crate::errors::{Error, Result};

/// Rates into ETB, the pivot currency of every conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRates {
    pub usd_to_etb: Decimal,
    pub eur_to_etb: Decimal,
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self {
            usd_to_etb: dec!(55.0),
            eur_to_etb: dec!(60.0),
        }
    }
}

impl ExchangeRates {
    /// Builds a rate set from possibly missing entries. Missing or
    /// non-positive rates take the default.
    pub fn from_partial(usd_to_etb: Option<Decimal>, eur_to_etb: Option<Decimal>) -> Self {
        let defaults = Self::default();
        Self {
            usd_to_etb: positive(usd_to_etb).unwrap_or(defaults.usd_to_etb),
            eur_to_etb: positive(eur_to_etb).unwrap_or(defaults.eur_to_etb),
        }
    }

    /// Units of ETB per unit of `currency`.
    pub fn to_etb(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Etb => Decimal::ONE,
            Currency::Usd => self.usd_to_etb,
            Currency::Eur => self.eur_to_etb,
        }
    }
}

pub(crate) fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| v.is_sign_positive() && !v.is_zero())
}

/// Converts amounts between ETB, USD and EUR through ETB.
///
/// No rounding happens here; amounts keep full decimal precision until the
/// storage layer writes them.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrencyConverter {
    rates: ExchangeRates,
}

impl CurrencyConverter {
    pub fn new(rates: ExchangeRates) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &ExchangeRates {
        &self.rates
    }

    pub fn convert_amount(&self, amount: Decimal, from: Currency, to: Currency) -> Result<Decimal> {
        if from == to {
            return Ok(amount);
        }

        let in_etb = amount
            .checked_mul(self.rates.to_etb(from))
            .ok_or_else(|| overflow(amount, from, to))?;

        if to == Currency::Etb {
            return Ok(in_etb);
        }

        let target_rate = self.rates.to_etb(to);
        if target_rate.is_zero() {
            return Err(Error::CurrencyConversionFailed(format!(
                "No usable {} rate to convert {} into",
                to, from
            )));
        }
        in_etb
            .checked_div(target_rate)
            .ok_or_else(|| overflow(amount, from, to))
    }
}

fn overflow(amount: Decimal, from: Currency, to: Currency) -> Error {
    Error::CurrencyConversionFailed(format!(
        "Amount {} overflowed converting {} to {}",
        amount, from, to
    ))
}
