//! Database model for per-cluster exchange rates.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use budgetledger_core::fx::{ClusterCurrencyConfig, ClusterCurrencyUpdate};

use crate::utils::parse_optional_decimal;

#[derive(Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::cluster_currency_rates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(primary_key(cluster))]
#[diesel(treat_none_as_null = true)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCurrencyRateDB {
    pub cluster: String,
    pub usd_to_etb: Option<String>,
    pub eur_to_etb: Option<String>,
    pub custom_currency_enabled: bool,
    pub updated_at: NaiveDateTime,
}

impl ClusterCurrencyRateDB {
    pub fn from_update(cluster: &str, update: &ClusterCurrencyUpdate, now: NaiveDateTime) -> Self {
        Self {
            cluster: cluster.to_string(),
            usd_to_etb: update.usd_to_etb.map(|r| r.to_string()),
            eur_to_etb: update.eur_to_etb.map(|r| r.to_string()),
            custom_currency_enabled: update.custom_currency_enabled,
            updated_at: now,
        }
    }
}

impl From<ClusterCurrencyRateDB> for ClusterCurrencyConfig {
    fn from(db: ClusterCurrencyRateDB) -> Self {
        Self {
            usd_to_etb: parse_optional_decimal("usd_to_etb", db.usd_to_etb.as_deref()),
            eur_to_etb: parse_optional_decimal("eur_to_etb", db.eur_to_etb.as_deref()),
            cluster: db.cluster,
            custom_currency_enabled: db.custom_currency_enabled,
            updated_at: db.updated_at,
        }
    }
}
