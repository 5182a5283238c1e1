use crate::server::AppState;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Json};
use f5api_core::VersionInfo;
use f5api_observability::prometheus_exporter::CONTENT_TYPE;
use std::sync::Arc;

pub async fn ping() -> &'static str {
    "pong"
}

pub async fn version(State(state): State<Arc<AppState>>) -> Json<VersionInfo> {
    Json(state.version.clone())
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], state.metrics.render())
}
