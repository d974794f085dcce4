use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub gateway: String,
    pub gateway_configured: bool,
}

pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let version = env!("CARGO_PKG_VERSION").to_string();

    let plugin = state
        .settings
        .plugin_settings()
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    let response = HealthResponse {
        status: "healthy".to_string(),
        version,
        environment: state.environment.clone(),
        gateway: state.gateway_name.to_string(),
        gateway_configured: !plugin.url.trim().is_empty(),
    };

    Ok(Json(response))
}
