//! GOV.UK Pay payment method for an event-registration host
//!
//! The crate is split along the host boundary: [`host`] declares what the plugin
//! needs from the host application, [`payments`] drives the gateway, and [`api`]
//! exposes the registrant-facing endpoints over axum.

pub mod api;
pub mod config;
pub mod currency;
pub mod error;
pub mod format;
pub mod forms;
pub mod host;
pub mod payments;
pub mod plugin;
pub mod urls;

use crate::api::{admin_auth, health, payment, settings};
use crate::host::{RegistrationRepository, SettingsStore};
use crate::payments::flow::PaymentFlow;
use crate::plugin::Endpoint;
use axum::routing::{get, put, MethodRouter};
use axum::{middleware, Router};
use http::HeaderName;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<PaymentFlow>,
    pub registrations: Arc<dyn RegistrationRepository>,
    pub settings: Arc<dyn SettingsStore>,
    pub environment: String,
    pub gateway_name: &'static str,
}

fn endpoint_handler(endpoint: Endpoint) -> MethodRouter<AppState> {
    match endpoint {
        Endpoint::Init => get(payment::init_payment),
        Endpoint::Query => get(payment::query_payment),
        Endpoint::Success => get(payment::payment_success),
        Endpoint::Cancel => get(payment::payment_cancel),
        Endpoint::Failure => get(payment::payment_failure),
    }
}

/// Build the application router
///
/// Settings routes require `internal_api_key` in the `X-Internal-Api-Key` header. An
/// empty key locks them entirely.
pub fn create_router(state: AppState, internal_api_key: String) -> Router {
    let payment_routes = Endpoint::ALL
        .into_iter()
        .fold(Router::new(), |router, endpoint| {
            router.route(&endpoint.route(), endpoint_handler(endpoint))
        });

    let admin_routes = Router::new()
        .route("/admin/govukpay/settings", put(settings::update_plugin_settings))
        .route(
            "/admin/govukpay/events/:event_id/settings",
            put(settings::update_event_settings),
        )
        .route_layer(middleware::from_fn_with_state(
            internal_api_key,
            admin_auth::require_internal_api_key,
        ));

    let request_id = HeaderName::from_static("x-request-id");

    Router::new()
        .route("/health", get(health::health_check))
        .merge(payment_routes)
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .with_state(state)
}
