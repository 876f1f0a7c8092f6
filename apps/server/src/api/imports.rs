use std::sync::Arc;

use crate::{
    context::Caller,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use budgetledger_core::imports::ImportSummary;

/// Room for the multipart framing around the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

const FILE_FIELD: &str = "file";

async fn import_transactions(
    State(state): State<Arc<AppState>>,
    Caller(ctx): Caller,
    mut multipart: Multipart,
) -> ApiResult<Json<ImportSummary>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        tracing::info!("Importing '{}' ({} bytes)", file_name, bytes.len());
        let summary = state
            .import_service
            .import_file(&ctx, &file_name, bytes.to_vec())
            .await?;
        return Ok(Json(summary));
    }
    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

pub fn router(max_bytes: usize) -> Router<Arc<AppState>> {
    Router::new().route(
        "/transactions/import",
        post(import_transactions)
            .layer(DefaultBodyLimit::max(max_bytes + MULTIPART_OVERHEAD_BYTES)),
    )
}
