use crate::server::{AppState, PUBLIC_PATHS};
use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const AUTH_HEADER: &str = "X-Auth-Token";

/// Token check for non-public paths.
///
/// `X-Auth-Token` must carry a bcrypt hash of the pre-shared token. CORS
/// preflight (`OPTIONS`) is answered here without authentication.
pub async fn token_auth(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        info!("Setting CORS preflight options and returning");
        return (
            StatusCode::OK,
            [
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
                (header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(AUTH_HEADER)),
            ],
        )
            .into_response();
    }

    let path = request.uri().path().to_owned();
    if PUBLIC_PATHS.contains(&path.as_str()) {
        debug!(path = %path, "Not authenticating public path");
        return next.run(request).await;
    }

    let hashed = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let token = state.token.clone();

    // CPU bound, run on the blocking pool.
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(token, &hashed)).await;
    match verified {
        Ok(Ok(true)) => {
            info!(path = %path, "Successfully authenticated token");
            next.run(request).await
        }
        Ok(Ok(false)) => {
            warn!(path = %path, "Unable to authenticate session: token mismatch");
            StatusCode::FORBIDDEN.into_response()
        }
        Ok(Err(e)) => {
            warn!(path = %path, error = %e, "Unable to authenticate session");
            StatusCode::FORBIDDEN.into_response()
        }
        Err(e) => {
            warn!(path = %path, error = %e, "Token verification task failed");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// Record request count, latency, and in-flight gauge by matched route.
pub async fn track_metrics(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = request.method().to_string();

    let start = Instant::now();
    state.metrics.request_started();
    let response = next.run(request).await;
    state.metrics.request_finished();

    state.metrics.record_request(
        &route,
        &method,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}
