use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::currency_converter::{positive, ExchangeRates};

/// Exchange rates and the custom-rate permission of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCurrencyConfig {
    pub cluster: String,
    pub usd_to_etb: Option<Decimal>,
    pub eur_to_etb: Option<Decimal>,
    /// Whether submissions in this cluster may override the rates.
    pub custom_currency_enabled: bool,
    pub updated_at: NaiveDateTime,
}

impl ClusterCurrencyConfig {
    pub fn rates(&self) -> ExchangeRates {
        ExchangeRates::from_partial(self.usd_to_etb, self.eur_to_etb)
    }
}

/// Input for creating or replacing a cluster's currency configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCurrencyUpdate {
    pub usd_to_etb: Option<Decimal>,
    pub eur_to_etb: Option<Decimal>,
    #[serde(default)]
    pub custom_currency_enabled: bool,
}

/// Per-transaction rate override as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRateRequest {
    #[serde(default)]
    pub use_custom_rate: bool,
    pub usd_to_etb: Option<Decimal>,
    pub eur_to_etb: Option<Decimal>,
    pub usd_to_eur: Option<Decimal>,
}

/// Custom rates that were actually honoured, as stored on the transaction record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCustomRates {
    pub usd_to_etb: Option<Decimal>,
    pub eur_to_etb: Option<Decimal>,
    pub usd_to_eur: Option<Decimal>,
}

/// The rates a single conversion runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveRates {
    pub rates: ExchangeRates,
    pub custom_applied: bool,
    pub custom: AppliedCustomRates,
}

impl EffectiveRates {
    /// Picks the rates for one transaction.
    ///
    /// A caller-supplied rate replaces the cluster rate only when the cluster
    /// permits overrides, the caller asked for it, and the value is positive.
    pub fn resolve(config: Option<&ClusterCurrencyConfig>, request: &CustomRateRequest) -> Self {
        let base = config.map(|c| c.rates()).unwrap_or_default();
        let permitted = config.is_some_and(|c| c.custom_currency_enabled);

        if !(permitted && request.use_custom_rate) {
            if request.use_custom_rate {
                log::debug!("Custom rate requested but not permitted for this cluster");
            }
            return Self {
                rates: base,
                custom_applied: false,
                custom: AppliedCustomRates::default(),
            };
        }

        let custom = AppliedCustomRates {
            usd_to_etb: positive(request.usd_to_etb),
            eur_to_etb: positive(request.eur_to_etb),
            usd_to_eur: positive(request.usd_to_eur),
        };
        let rates = ExchangeRates {
            usd_to_etb: custom.usd_to_etb.unwrap_or(base.usd_to_etb),
            eur_to_etb: custom.eur_to_etb.unwrap_or(base.eur_to_etb),
        };
        let custom_applied = custom.usd_to_etb.is_some() || custom.eur_to_etb.is_some();

        Self {
            rates,
            custom_applied,
            custom,
        }
    }
}
