//! Registrant-facing payment endpoints
//!
//! Every endpoint is addressed by a registration locator: event and form ids in the
//! path, the registration token in the `token` query parameter.

use crate::error::{AppResult, DomainError};
use crate::host::{Registration, RegistrationLocator};
use crate::payments::flow::SettingsScope;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RegistrationPath {
    pub event_id: u64,
    pub reg_form_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Uuid,
}

async fn load_registration(
    state: &AppState,
    path: RegistrationPath,
    query: TokenQuery,
) -> AppResult<Registration> {
    let locator = RegistrationLocator {
        event_id: path.event_id,
        reg_form_id: path.reg_form_id,
        token: query.token,
    };
    state
        .registrations
        .find_by_locator(&locator)
        .await?
        .ok_or_else(|| DomainError::RegistrationNotFound(locator).into())
}

/// Start a payment and send the registrant to the GOV.UK Pay hosted page
pub async fn init_payment(
    State(state): State<AppState>,
    Path(path): Path<RegistrationPath>,
    Query(query): Query<TokenQuery>,
) -> AppResult<Redirect> {
    let registration = load_registration(&state, path, query).await?;
    let plugin = state.settings.plugin_settings().await?;
    let event = state.settings.event_settings(registration.event_id).await?;
    let scope = SettingsScope {
        plugin: &plugin,
        event: &event,
    };

    let payment_url = state.flow.initiate(&registration, scope).await?;
    Ok(Redirect::to(&payment_url))
}

/// Return URL of the gateway
pub async fn query_payment(
    State(state): State<AppState>,
    Path(path): Path<RegistrationPath>,
    Query(query): Query<TokenQuery>,
) -> AppResult<Redirect> {
    let registration = load_registration(&state, path, query).await?;
    let plugin = state.settings.plugin_settings().await?;
    let event = state.settings.event_settings(registration.event_id).await?;
    let scope = SettingsScope {
        plugin: &plugin,
        event: &event,
    };

    let next = state.flow.confirm(&registration, scope).await?;
    Ok(Redirect::to(&next))
}

pub async fn payment_success(
    State(state): State<AppState>,
    Path(path): Path<RegistrationPath>,
    Query(query): Query<TokenQuery>,
) -> AppResult<Redirect> {
    let registration = load_registration(&state, path, query).await?;
    Ok(Redirect::to(&state.flow.complete(&registration).await?))
}

pub async fn payment_cancel(
    State(state): State<AppState>,
    Path(path): Path<RegistrationPath>,
    Query(query): Query<TokenQuery>,
) -> AppResult<Redirect> {
    let registration = load_registration(&state, path, query).await?;
    Ok(Redirect::to(&state.flow.cancel(&registration).await?))
}

pub async fn payment_failure(
    State(state): State<AppState>,
    Path(path): Path<RegistrationPath>,
    Query(query): Query<TokenQuery>,
) -> AppResult<Redirect> {
    let registration = load_registration(&state, path, query).await?;
    Ok(Redirect::to(&state.flow.fail(&registration).await?))
}
