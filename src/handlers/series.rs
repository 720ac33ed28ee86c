use axum::extract::Path;

use crate::error::ApiError;

/// POST /db/:db/series - point ingest; writes are not accepted by this gateway yet
pub async fn series_write(Path(db): Path<String>) -> ApiError {
    tracing::debug!(database = %db, "series write rejected");
    ApiError::not_implemented("series ingest is not implemented")
}
