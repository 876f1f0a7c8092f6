use super::fx_model::{
    ClusterCurrencyConfig, ClusterCurrencyUpdate, CustomRateRequest, EffectiveRates,
};
use crate::errors::Result;
use async_trait::async_trait;

/// Trait defining the contract for cluster currency configuration storage.
#[async_trait]
pub trait ClusterCurrencyRepositoryTrait: Send + Sync {
    fn get_cluster_config(&self, cluster: &str) -> Result<Option<ClusterCurrencyConfig>>;
    async fn upsert_cluster_config(
        &self,
        cluster: &str,
        update: ClusterCurrencyUpdate,
    ) -> Result<ClusterCurrencyConfig>;
}

/// Trait defining the contract for FX service operations.
#[async_trait]
pub trait FxServiceTrait: Send + Sync {
    fn get_cluster_config(&self, cluster: &str) -> Result<Option<ClusterCurrencyConfig>>;

    /// Rates for one transaction in `cluster` (defaults when the cluster is
    /// unknown or absent).
    fn effective_rates(
        &self,
        cluster: Option<&str>,
        request: &CustomRateRequest,
    ) -> Result<EffectiveRates>;

    async fn update_cluster_config(
        &self,
        cluster: &str,
        update: ClusterCurrencyUpdate,
    ) -> Result<ClusterCurrencyConfig>;
}
