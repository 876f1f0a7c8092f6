use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, ValidationError};

/// Currencies a ledger row or a transaction amount can be denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Etb,
    Usd,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Etb, Currency::Usd, Currency::Eur];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Etb => "ETB",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    /// Parses a currency code, falling back to `default` for blank or
    /// unknown codes.
    pub fn parse_or(code: Option<&str>, default: Currency) -> Currency {
        match code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) => c.parse().unwrap_or_else(|_| {
                log::debug!("Unknown currency code '{}', using {}", c, default);
                default
            }),
            None => default,
        }
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ETB" => Ok(Currency::Etb),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(ValidationError::InvalidInput(format!(
                "Unsupported currency code: {}",
                other
            ))
            .into()),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
