use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::types::User;

/// GET /users - user accounts, sorted by name; password hashes are never serialized
pub async fn users_list(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let mut users = state.backend.users().await?;
    users.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(ApiResponse::success(users))
}
