use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::{StatementDispatcher, StatementResult};
use crate::types::Identity;

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub results: Vec<StatementResult>,
}

/// GET /query?q= - parse the query text and run its statements in order
pub async fn query(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> ApiResult<QueryResponse> {
    let Query(params) = params?;
    let text = params
        .q
        .ok_or_else(|| ApiError::bad_request("missing required parameter \"q\""))?;
    let parsed: crate::query::Query = text.parse()?;

    let dispatcher = StatementDispatcher::new(state.backend.as_ref(), state.config.auth.enabled);
    let results = dispatcher.dispatch(&parsed, &identity).await?;

    Ok(ApiResponse::success(QueryResponse { results }))
}
