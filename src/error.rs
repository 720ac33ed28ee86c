// HTTP API Error Types
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::auth::CredentialError;
use crate::cluster::ClusterError;
use crate::query::ParseError;
use crate::services::DispatchError;

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Every rejection in the gateway ends up here, so status-code policy lives
/// in one place.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 501 Not Implemented
    NotImplemented(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::NotImplemented(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::NotImplemented(_) => "NOT_IMPLEMENTED",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": self.message(),
            "code": self.error_code()
        })
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        ApiError::NotImplemented(message.into())
    }
}

impl From<ClusterError> for ApiError {
    fn from(err: ClusterError) -> Self {
        if err.is_not_found() {
            ApiError::not_found(err.to_string())
        } else if err.is_conflict() {
            ApiError::conflict(err.to_string())
        } else if err.is_invalid_input() {
            ApiError::bad_request(err.to_string())
        } else if let ClusterError::Internal(msg) = &err {
            tracing::error!("Cluster error: {}", msg);
            ApiError::internal_server_error(err.to_string())
        } else {
            // InvalidPassword, BootstrapClosed
            ApiError::unauthorized(err.to_string())
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::BootstrapViolation => ApiError::unauthorized(err.to_string()),
            DispatchError::InvalidStatement { index, message } => {
                tracing::debug!(index, "Rejected statement: {}", message);
                ApiError::bad_request(message)
            }
            DispatchError::Backend {
                index,
                statement,
                source,
            } => {
                tracing::warn!(index, statement, "Statement failed: {}", source);
                source.into()
            }
            DispatchError::Cluster(source) => source.into(),
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        ApiError::unauthorized(err.to_string())
    }
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        ApiError::bad_request(format!("error parsing query: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_errors_map_to_status_classes() {
        let cases = [
            (ClusterError::DatabaseNotFound, StatusCode::NOT_FOUND),
            (ClusterError::DataNodeNotFound, StatusCode::NOT_FOUND),
            (ClusterError::RetentionPolicyExists, StatusCode::CONFLICT),
            (ClusterError::DataNodeUrlRequired, StatusCode::BAD_REQUEST),
            (ClusterError::InvalidReplicaN, StatusCode::BAD_REQUEST),
            (ClusterError::InvalidPassword, StatusCode::UNAUTHORIZED),
            (ClusterError::Internal("disk full".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn message_is_the_error_text() {
        let err = ApiError::from(ClusterError::DatabaseNotFound);
        assert_eq!(
            err.to_json(),
            json!({ "error": "database not found", "code": "NOT_FOUND" })
        );
    }

    #[test]
    fn bootstrap_violation_is_unauthorized() {
        let err = ApiError::from(DispatchError::BootstrapViolation);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "initial admin user does not exist");
    }

    #[test]
    fn failed_statement_uses_backend_classification() {
        let err = ApiError::from(DispatchError::Backend {
            index: 2,
            statement: "CREATE DATABASE",
            source: ClusterError::DatabaseExists,
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.message(), "database exists");
    }

    #[test]
    fn credential_errors_are_unauthorized() {
        let err = ApiError::from(CredentialError::InvalidHeader);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "invalid authentication header");
    }

    #[test]
    fn parse_errors_are_prefixed() {
        let err = ApiError::from(ParseError::UnterminatedString);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.message().starts_with("error parsing query: "));
    }
}
