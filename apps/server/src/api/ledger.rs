use std::sync::Arc;

use crate::{context::Caller, error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use budgetledger_core::ledger::{LedgerRow, LedgerScope, NewLedgerRow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct YearQuery {
    year: i32,
}

#[derive(Debug, Deserialize)]
struct CertifyRequest {
    year: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CertifyResponse {
    success: bool,
    rows_certified: usize,
}

async fn list_ledger(
    State(state): State<Arc<AppState>>,
    Caller(ctx): Caller,
    Query(query): Query<YearQuery>,
) -> ApiResult<Json<Vec<LedgerRow>>> {
    let rows = state
        .ledger_service
        .list_rows(&LedgerScope::new(query.year, ctx.cluster))?;
    Ok(Json(rows))
}

async fn seed_rows(
    State(state): State<Arc<AppState>>,
    Json(rows): Json<Vec<NewLedgerRow>>,
) -> ApiResult<(StatusCode, Json<Vec<LedgerRow>>)> {
    let inserted = state.ledger_service.seed_rows(rows).await?;
    Ok((StatusCode::CREATED, Json(inserted)))
}

async fn certify(
    State(state): State<Arc<AppState>>,
    Caller(ctx): Caller,
    Json(request): Json<CertifyRequest>,
) -> ApiResult<Json<CertifyResponse>> {
    let rows_certified = state
        .ledger_service
        .certify(LedgerScope::new(request.year, ctx.cluster))
        .await?;
    Ok(Json(CertifyResponse {
        success: true,
        rows_certified,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ledger", get(list_ledger))
        .route("/ledger/rows", post(seed_rows))
        .route("/ledger/certify", post(certify))
}
