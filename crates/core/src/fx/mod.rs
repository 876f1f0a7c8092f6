//! FX (Foreign Exchange) module - currencies, cluster rates and conversion.

pub mod currency;
pub mod currency_converter;
mod fx_model;
mod fx_service;
mod fx_traits;

pub use currency::Currency;
pub use currency_converter::{CurrencyConverter, ExchangeRates};
pub use fx_model::{
    AppliedCustomRates, ClusterCurrencyConfig, ClusterCurrencyUpdate, CustomRateRequest,
    EffectiveRates,
};
pub use fx_service::FxService;
pub use fx_traits::{ClusterCurrencyRepositoryTrait, FxServiceTrait};
