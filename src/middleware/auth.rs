use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};

use crate::auth::extract_credentials;
use crate::cluster::{Backend, ClusterError};
use crate::error::ApiError;
use crate::types::Identity;

/// Decides per request whether credentials are needed and resolves the caller
#[derive(Clone)]
pub struct AuthGate {
    enabled: bool,
    backend: Arc<dyn Backend>,
}

impl AuthGate {
    pub fn new(enabled: bool, backend: Arc<dyn Backend>) -> Self {
        Self { enabled, backend }
    }

    /// Resolve the caller identity, or the rejection to send instead.
    ///
    /// Authentication is waived while it is disabled and while the cluster
    /// has no users at all (bootstrap mode); both yield `Identity::Anonymous`.
    pub async fn resolve(&self, uri: &Uri, headers: &HeaderMap) -> Result<Identity, ApiError> {
        if !self.enabled {
            debug!("authentication disabled");
            return Ok(Identity::Anonymous);
        }

        let users = self.backend.users_count().await.map_err(|e| {
            error!("Failed to count users: {}", e);
            ApiError::internal_server_error(e.to_string())
        })?;
        if users == 0 {
            debug!("no users yet, authentication waived for bootstrap");
            return Ok(Identity::Anonymous);
        }

        let credentials = extract_credentials(uri.query(), headers).map_err(|e| {
            warn!("Rejected malformed credentials: {}", e);
            ApiError::from(e)
        })?;

        let credentials = match credentials {
            Some(credentials) if !credentials.username.is_empty() => credentials,
            _ => {
                warn!("Rejected request without username");
                return Err(ApiError::unauthorized("username required"));
            }
        };

        match self
            .backend
            .authenticate(&credentials.username, &credentials.password)
            .await
        {
            Ok(user) => {
                debug!(user = %user.name, "authenticated");
                Ok(Identity::from(&user))
            }
            Err(ClusterError::Internal(msg)) => {
                error!(user = %credentials.username, "Authentication backend failure: {}", msg);
                Err(ApiError::internal_server_error(msg))
            }
            Err(e) => {
                warn!(user = %credentials.username, "Authentication failed: {}", e);
                Err(ApiError::unauthorized(e.to_string()))
            }
        }
    }
}

/// Authentication middleware that resolves the caller and stores the
/// `Identity` in request extensions for handlers
pub async fn authenticate(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = gate.resolve(request.uri(), request.headers()).await?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
