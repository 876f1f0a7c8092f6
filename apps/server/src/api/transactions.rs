use std::sync::Arc;

use crate::{context::Caller, error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use budgetledger_core::{
    ledger::LedgerScope,
    transactions::{
        BudgetCheck, BudgetCheckRequest, SubmissionResult, TransactionRecord,
        TransactionSubmission,
    },
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RecordsQuery {
    year: i32,
    cluster: Option<String>,
}

async fn submit_transaction(
    State(state): State<Arc<AppState>>,
    Caller(ctx): Caller,
    Json(submission): Json<TransactionSubmission>,
) -> ApiResult<Json<SubmissionResult>> {
    let result = state.transaction_service.submit(&ctx, submission).await?;
    Ok(Json(result))
}

/// Records of a year. An explicit `cluster` parameter wins over the caller's.
async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Caller(ctx): Caller,
    Query(query): Query<RecordsQuery>,
) -> ApiResult<Json<Vec<TransactionRecord>>> {
    let cluster = query
        .cluster
        .filter(|c| !c.trim().is_empty())
        .or(ctx.cluster);
    let records = state
        .transaction_service
        .list_records(&LedgerScope::new(query.year, cluster))?;
    Ok(Json(records))
}

async fn check_budget(
    State(state): State<Arc<AppState>>,
    Caller(ctx): Caller,
    Json(request): Json<BudgetCheckRequest>,
) -> ApiResult<Json<BudgetCheck>> {
    let check = state.transaction_service.check_budget(&ctx, &request)?;
    Ok(Json(check))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(submit_transaction),
        )
        .route("/budget/check", post(check_budget))
}
