use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/// GET /db - database names in sorted order
pub async fn databases_list(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let mut names = state.backend.databases().await?;
    names.sort();
    Ok(ApiResponse::success(names))
}
