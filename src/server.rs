use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cluster::Backend;
use crate::config::GatewayConfig;
use crate::handlers;
use crate::middleware::{authenticate, with_response_headers, AuthGate};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub backend: Arc<dyn Backend>,
    pub gate: AuthGate,
}

impl AppState {
    pub fn new(config: GatewayConfig, backend: Arc<dyn Backend>) -> Self {
        let gate = AuthGate::new(config.auth.enabled, backend.clone());
        Self {
            config: Arc::new(config),
            backend,
            gate,
        }
    }
}

/// Build the router: routes behind the gate, then body limit, response
/// headers and request tracing around everything
pub fn app(state: AppState) -> Router {
    let version = HeaderValue::from_str(&state.config.api.version)
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
    let max_body = state.config.api.max_request_size_bytes;
    let request_logging = state.config.api.enable_request_logging;

    let router = Router::new()
        .route("/ping", get(handlers::ping))
        .route("/query", get(handlers::query))
        .merge(database_routes())
        .merge(cluster_routes())
        .route_layer(from_fn_with_state(state.gate.clone(), authenticate))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body));
    let router = with_response_headers(router, version);

    if request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn database_routes() -> Router<AppState> {
    Router::new()
        .route("/db", get(handlers::databases_list))
        .route("/db/:db/series", post(handlers::series_write))
        .route("/db/:db/shards", get(handlers::shards_list))
        .route("/db/:db/shards/:id", delete(handlers::shard_delete))
        .route(
            "/db/:db/retention_policies",
            get(handlers::retention_policies_list).post(handlers::retention_policy_create),
        )
        .route(
            "/db/:db/retention_policies/:name",
            put(handlers::retention_policy_update).delete(handlers::retention_policy_delete),
        )
}

fn cluster_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::users_list))
        .route(
            "/data_nodes",
            get(handlers::data_nodes_list).post(handlers::data_node_create),
        )
        .route("/data_nodes/:id", delete(handlers::data_node_delete))
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: GatewayConfig, backend: Arc<dyn Backend>) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    info!(
        environment = ?config.environment,
        auth_enabled = config.auth.enabled,
        "Starting gateway"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Gateway listening on http://{}", addr);

    let state = AppState::new(config, backend);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
