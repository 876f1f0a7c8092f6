use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use budgetledger_core::RequestContext;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const CLUSTER_HEADER: &str = "x-cluster";

/// The caller's identity and cluster, taken from request headers.
/// Authentication happens in front of this service.
#[derive(Debug, Clone)]
pub struct Caller(pub RequestContext);

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(RequestContext::new(
            header(&parts.headers, USER_ID_HEADER),
            header(&parts.headers, CLUSTER_HEADER),
        )))
    }
}
