use crate::error::AppResult;
use crate::forms::{EventSettingsForm, PluginSettingsForm};
use crate::plugin::PluginSettings;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

/// Save the plugin-wide settings
pub async fn update_plugin_settings(
    State(state): State<AppState>,
    Json(form): Json<PluginSettingsForm>,
) -> AppResult<Json<PluginSettings>> {
    form.validate()?;

    let mut settings = state.settings.plugin_settings().await?;
    form.apply_to(&mut settings);
    state.settings.save_plugin_settings(settings.clone()).await?;

    info!("Plugin settings updated: url={}", settings.url);
    Ok(Json(settings))
}

/// Save the settings of one event; the stored token is never echoed back
pub async fn update_event_settings(
    State(state): State<AppState>,
    Path(event_id): Path<u64>,
    Json(form): Json<EventSettingsForm>,
) -> AppResult<StatusCode> {
    form.validate()?;

    let mut settings = state.settings.event_settings(event_id).await?;
    form.apply_to(&mut settings);
    info!(
        "Event settings updated: event={}, enabled={}",
        event_id, settings.enabled
    );
    state.settings.save_event_settings(event_id, settings).await?;

    Ok(StatusCode::NO_CONTENT)
}
