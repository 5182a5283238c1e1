use crate::error::HttpError;
use crate::server::AppState;
use axum::extract::{Path, State};
use axum::response::Json;
use bytes::Bytes;
use f5api_core::{ApiError, ClientSslProfile, ProfileMode, ProfileRequest};
use f5api_ltm::ProfileOrchestrator;
use std::sync::Arc;
use tracing::info;

/// List client-ssl profile names on a host.
pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
    Path(host): Path<String>,
) -> Result<Json<Vec<String>>, HttpError> {
    let client = state.registry.get(&host)?;
    let names = ProfileOrchestrator::new(client.as_ref()).list_profiles().await?;
    Ok(Json(names))
}

/// Show detail of one client-ssl profile.
pub async fn show_profile(
    State(state): State<Arc<AppState>>,
    Path((host, name)): Path<(String, String)>,
) -> Result<Json<ClientSslProfile>, HttpError> {
    let client = state.registry.get(&host)?;
    let profile = ProfileOrchestrator::new(client.as_ref()).get_profile(&name).await?;
    Ok(Json(profile))
}

/// Delete a profile together with the certificate and key it references.
pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    Path((host, name)): Path<(String, String)>,
) -> Result<String, HttpError> {
    info!(host = %host, profile = %name, "delete client-ssl profile");
    let client = state.registry.get(&host)?;
    ProfileOrchestrator::new(client.as_ref()).delete(&name).await?;
    Ok(format!("deleted client-ssl profile {name} on host {host}"))
}

pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    Path((host, name)): Path<(String, String)>,
    body: Bytes,
) -> Result<String, HttpError> {
    write_profile(&state, &host, &name, &body, ProfileMode::Create).await
}

/// Modify a profile, replacing its cert and key with the uploaded pair.
pub async fn modify_profile(
    State(state): State<Arc<AppState>>,
    Path((host, name)): Path<(String, String)>,
    body: Bytes,
) -> Result<String, HttpError> {
    write_profile(&state, &host, &name, &body, ProfileMode::Modify).await
}

async fn write_profile(
    state: &AppState,
    host: &str,
    name: &str,
    body: &[u8],
    mode: ProfileMode,
) -> Result<String, HttpError> {
    info!(host = %host, profile = %name, ?mode, "write client-ssl profile");

    let client = state.registry.get(host)?;
    let request: ProfileRequest = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadInput(format!("failed to parse request body: {e}")))?;

    let soft_failures = ProfileOrchestrator::new(client.as_ref())
        .create_or_modify(name, request, mode)
        .await?;
    for failure in &soft_failures {
        state
            .metrics
            .record_soft_failure(host, failure.object.as_str(), failure.conflict);
    }

    Ok(format!("{} client-ssl profile {name} on host {host}", mode.verb()))
}
