use crate::{handlers, middleware};
use axum::{
    Router,
    routing::{get, put},
};
use f5api_core::VersionInfo;
use f5api_ltm::HostRegistry;
use f5api_observability::MetricsCollector;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Paths served without a token.
pub const PUBLIC_PATHS: &[&str] = &["/v1/f5/ping", "/v1/f5/version", "/v1/f5/metrics"];

/// Shared state for request handlers. Immutable once the server starts.
pub struct AppState {
    pub registry: Arc<HostRegistry>,
    pub metrics: Arc<MetricsCollector>,
    /// Pre-shared token the `X-Auth-Token` hash is verified against.
    pub token: String,
    pub version: VersionInfo,
    pub request_timeout: Duration,
}

/// Build the router with all API routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/ping", get(handlers::health::ping))
        .route("/version", get(handlers::health::version))
        .route("/metrics", get(handlers::health::metrics))
        .route("/{host}/clientssl", get(handlers::clientssl::list_profiles))
        .route(
            "/{host}/clientssl/{name}",
            get(handlers::clientssl::show_profile).delete(handlers::clientssl::delete_profile),
        )
        .route("/{host}/createclientssl/{name}", put(handlers::clientssl::create_profile))
        .route("/{host}/updateclientssl/{name}", put(handlers::clientssl::modify_profile));

    // Innermost first: auth, then the request deadline, then metrics so
    // rejected and timed-out requests are still counted.
    Router::new()
        .nest("/v1/f5", api)
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::token_auth,
        ))
        .layer(TimeoutLayer::new(state.request_timeout))
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::track_metrics,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn start(
    addr: &str,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(addr = %listener.local_addr()?, "Starting listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
