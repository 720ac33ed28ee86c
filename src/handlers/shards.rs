use axum::extract::{Path, State};

use super::parse_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::types::Shard;

/// GET /db/:db/shards - shards of a database
pub async fn shards_list(
    State(state): State<AppState>,
    Path(db): Path<String>,
) -> ApiResult<Vec<Shard>> {
    let shards = state.backend.shards(&db).await?;
    Ok(ApiResponse::success(shards))
}

/// DELETE /db/:db/shards/:id - drop one shard
pub async fn shard_delete(
    State(state): State<AppState>,
    Path((db, id)): Path<(String, String)>,
) -> ApiResult<()> {
    let id = parse_id(&id, "invalid shard id")?;
    state.backend.delete_shard(&db, id).await?;
    Ok(ApiResponse::no_content())
}
