use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;

use budgetledger_core::fx::{
    ClusterCurrencyConfig, ClusterCurrencyRepositoryTrait, ClusterCurrencyUpdate,
};
use budgetledger_core::Result;

use super::model::ClusterCurrencyRateDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::cluster_currency_rates;

pub struct ClusterCurrencyRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ClusterCurrencyRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl ClusterCurrencyRepositoryTrait for ClusterCurrencyRepository {
    fn get_cluster_config(&self, cluster: &str) -> Result<Option<ClusterCurrencyConfig>> {
        let mut conn = get_connection(&self.pool)?;
        let row = cluster_currency_rates::table
            .find(cluster)
            .select(ClusterCurrencyRateDB::as_select())
            .first::<ClusterCurrencyRateDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(ClusterCurrencyConfig::from))
    }

    async fn upsert_cluster_config(
        &self,
        cluster: &str,
        update: ClusterCurrencyUpdate,
    ) -> Result<ClusterCurrencyConfig> {
        let row = ClusterCurrencyRateDB::from_update(cluster, &update, Utc::now().naive_utc());
        self.writer
            .exec(move |conn| {
                diesel::insert_into(cluster_currency_rates::table)
                    .values(&row)
                    .on_conflict(cluster_currency_rates::cluster)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .into_core()?;
                log::info!("Updated currency configuration for cluster {}", row.cluster);
                Ok(ClusterCurrencyConfig::from(row))
            })
            .await
    }
}
