use axum::http::StatusCode;

/// GET /ping - liveness check
pub async fn ping() -> StatusCode {
    StatusCode::OK
}
