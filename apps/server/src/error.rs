use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use budgetledger_core::errors::{DatabaseError, Error as CoreError};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::main_lib::AppState;

/// Message shown for any storage failure. The cause only goes to the log
/// and, when enabled, the `debug` field.
pub const UPDATE_FAILED: &str = "Update failed";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug: Option<String>,
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Core(e) => match e {
                CoreError::Validation(_)
                | CoreError::CurrencyConversionFailed(_)
                | CoreError::Import(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                CoreError::Resolution(_) => (StatusCode::NOT_FOUND, e.to_string()),
                CoreError::Database(DatabaseError::UniqueViolation(_)) => {
                    (StatusCode::CONFLICT, e.to_string())
                }
                CoreError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, UPDATE_FAILED.to_string())
                }
            },
            ApiError::NotFound(reason) => (StatusCode::NOT_FOUND, reason.clone()),
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = ErrorBody {
            success: false,
            message,
            debug: None,
        };
        let detailed = ErrorBody {
            debug: Some(self.to_string()),
            ..body.clone()
        };
        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(detailed);
        response
    }
}

/// Swaps error bodies for their detailed form when `BL_EXPOSE_DEBUG` is on.
pub async fn expose_error_debug(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    if !state.expose_debug {
        return response;
    }
    match response.extensions_mut().remove::<ErrorBody>() {
        Some(detailed) => (response.status(), Json(detailed)).into_response(),
        None => response,
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
