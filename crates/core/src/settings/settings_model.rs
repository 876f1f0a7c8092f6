//! Ledger-wide tunables, resolved once at startup.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_IMPORT_MAX_BYTES;
use crate::errors::{Error, ValidationError};

/// What to do when no quarter row's stored date range contains a date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuarterFallback {
    /// Stored ranges are the only source of truth.
    #[default]
    None,
    /// Fall back to calendar quarters by month (1-3 Q1, 4-6 Q2, ...).
    Calendar,
}

impl FromStr for QuarterFallback {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(QuarterFallback::None),
            "calendar" => Ok(QuarterFallback::Calendar),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown quarter fallback '{}', expected none or calendar",
                other
            ))
            .into()),
        }
    }
}

/// How a quarter's forecast moves when money is spent against it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ForecastRule {
    /// `forecast = max(forecast - amount, 0)`
    #[default]
    Decrement,
    /// `forecast = max(budget - actual, 0)` after the spend is added.
    RemainingBudget,
}

impl FromStr for ForecastRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "decrement" => Ok(ForecastRule::Decrement),
            "remaining" | "remainingbudget" | "remaining_budget" => {
                Ok(ForecastRule::RemainingBudget)
            }
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown forecast rule '{}'",
                other
            ))
            .into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSettings {
    pub quarter_fallback: QuarterFallback,
    pub forecast_rule: ForecastRule,
    pub import_max_bytes: usize,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            quarter_fallback: QuarterFallback::None,
            forecast_rule: ForecastRule::Decrement,
            import_max_bytes: DEFAULT_IMPORT_MAX_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fallback_names() {
        assert_eq!(
            "Calendar".parse::<QuarterFallback>().unwrap(),
            QuarterFallback::Calendar
        );
        assert_eq!("".parse::<QuarterFallback>().unwrap(), QuarterFallback::None);
        assert!("monthly".parse::<QuarterFallback>().is_err());
    }

    #[test]
    fn defaults_to_decrement_rule() {
        let settings = LedgerSettings::default();
        assert_eq!(settings.forecast_rule, ForecastRule::Decrement);
        assert_eq!(settings.import_max_bytes, 5 * 1024 * 1024);
    }
}
