use super::fx_model::{
    ClusterCurrencyConfig, ClusterCurrencyUpdate, CustomRateRequest, EffectiveRates,
};
use super::fx_traits::{ClusterCurrencyRepositoryTrait, FxServiceTrait};
use crate::errors::{Result, ValidationError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Clone)]
pub struct FxService {
    repository: Arc<dyn ClusterCurrencyRepositoryTrait>,
}

impl FxService {
    pub fn new(repository: Arc<dyn ClusterCurrencyRepositoryTrait>) -> Self {
        Self { repository }
    }
}

fn validate_rate(name: &str, rate: Option<Decimal>) -> Result<()> {
    match rate {
        Some(r) if r <= Decimal::ZERO => Err(ValidationError::InvalidInput(format!(
            "{} must be a positive number",
            name
        ))
        .into()),
        _ => Ok(()),
    }
}

#[async_trait]
impl FxServiceTrait for FxService {
    fn get_cluster_config(&self, cluster: &str) -> Result<Option<ClusterCurrencyConfig>> {
        self.repository.get_cluster_config(cluster)
    }

    fn effective_rates(
        &self,
        cluster: Option<&str>,
        request: &CustomRateRequest,
    ) -> Result<EffectiveRates> {
        let config = match cluster {
            Some(c) => self.repository.get_cluster_config(c)?,
            None => None,
        };
        Ok(EffectiveRates::resolve(config.as_ref(), request))
    }

    async fn update_cluster_config(
        &self,
        cluster: &str,
        update: ClusterCurrencyUpdate,
    ) -> Result<ClusterCurrencyConfig> {
        if cluster.trim().is_empty() {
            return Err(ValidationError::MissingField("cluster".to_string()).into());
        }
        validate_rate("usdToEtb", update.usd_to_etb)?;
        validate_rate("eurToEtb", update.eur_to_etb)?;

        log::info!(
            "Updating currency config for cluster {} (custom rates {})",
            cluster,
            if update.custom_currency_enabled {
                "enabled"
            } else {
                "disabled"
            }
        );
        self.repository.upsert_cluster_config(cluster.trim(), update).await
    }
}
