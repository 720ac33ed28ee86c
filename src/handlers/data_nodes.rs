use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use url::Url;

use super::parse_id;
use crate::cluster::ClusterError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::types::DataNode;

#[derive(Debug, Deserialize)]
pub struct CreateDataNode {
    #[serde(default)]
    pub url: String,
}

/// GET /data_nodes - cluster members as `{"id", "url"}`
pub async fn data_nodes_list(State(state): State<AppState>) -> ApiResult<Vec<DataNode>> {
    let nodes = state.backend.data_nodes().await?;
    Ok(ApiResponse::success(nodes))
}

/// POST /data_nodes - register a node by URL
pub async fn data_node_create(
    State(state): State<AppState>,
    payload: Result<Json<CreateDataNode>, JsonRejection>,
) -> ApiResult<DataNode> {
    let Json(body) = payload?;

    if body.url.is_empty() {
        return Err(ClusterError::DataNodeUrlRequired.into());
    }
    let url = Url::parse(&body.url)
        .ok()
        .filter(|url| url.has_host())
        .ok_or_else(|| ApiError::bad_request("invalid data node url"))?;

    let node = state.backend.create_data_node(&url).await?;
    Ok(ApiResponse::created(node))
}

/// DELETE /data_nodes/:id - remove a node
pub async fn data_node_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id, "invalid node id")?;
    state.backend.delete_data_node(id).await?;
    Ok(ApiResponse::no_content())
}
