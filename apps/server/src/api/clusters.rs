use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use budgetledger_core::fx::{ClusterCurrencyConfig, ClusterCurrencyUpdate};

async fn get_cluster_currency(
    Path(cluster): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ClusterCurrencyConfig>> {
    state
        .fx_service
        .get_cluster_config(&cluster)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No currency settings for cluster {}", cluster)))
}

async fn update_cluster_currency(
    Path(cluster): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<ClusterCurrencyUpdate>,
) -> ApiResult<Json<ClusterCurrencyConfig>> {
    let config = state
        .fx_service
        .update_cluster_config(&cluster, update)
        .await?;
    Ok(Json(config))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/clusters/{cluster}/currency",
        get(get_cluster_currency).put(update_cluster_currency),
    )
}
