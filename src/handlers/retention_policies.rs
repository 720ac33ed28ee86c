use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::types::{RetentionPolicy, RetentionPolicyUpdate};

/// GET /db/:db/retention_policies
pub async fn retention_policies_list(
    State(state): State<AppState>,
    Path(db): Path<String>,
) -> ApiResult<Vec<RetentionPolicy>> {
    let policies = state.backend.retention_policies(&db).await?;
    Ok(ApiResponse::success(policies))
}

/// POST /db/:db/retention_policies
pub async fn retention_policy_create(
    State(state): State<AppState>,
    Path(db): Path<String>,
    payload: Result<Json<RetentionPolicy>, JsonRejection>,
) -> ApiResult<()> {
    let Json(policy) = payload?;
    state.backend.create_retention_policy(&db, policy).await?;
    Ok(ApiResponse::created(()))
}

/// PUT /db/:db/retention_policies/:name - partial update, fields left out stay as they are
pub async fn retention_policy_update(
    State(state): State<AppState>,
    Path((db, name)): Path<(String, String)>,
    payload: Result<Json<RetentionPolicyUpdate>, JsonRejection>,
) -> ApiResult<()> {
    let Json(update) = payload?;
    state.backend.update_retention_policy(&db, &name, update).await?;
    Ok(ApiResponse::no_content())
}

/// DELETE /db/:db/retention_policies/:name
pub async fn retention_policy_delete(
    State(state): State<AppState>,
    Path((db, name)): Path<(String, String)>,
) -> ApiResult<()> {
    state.backend.delete_retention_policy(&db, &name).await?;
    Ok(ApiResponse::no_content())
}
