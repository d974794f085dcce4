//! Integration tests for the payment and settings routes
//!
//! The router runs against the in-memory host and a scripted gateway; requests are
//! driven with `tower::ServiceExt::oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use govukpay_payment::host::memory::MemoryHost;
use govukpay_payment::host::{
    FlashCategory, Registration, RegistrationLocator, SettingsStore, TransactionAction,
};
use govukpay_payment::payments::flow::PaymentFlow;
use govukpay_payment::payments::providers::MockGateway;
use govukpay_payment::payments::types::PaymentStatus;
use govukpay_payment::plugin::{EventSettings, PluginSettings};
use govukpay_payment::urls::PluginUrls;
use govukpay_payment::{create_router, AppState};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const ADMIN_KEY: &str = "test-admin-key";
const NEXT_URL: &str = "https://card.payments.service.gov.uk/secure/8e7b6f";

struct TestApp {
    router: Router,
    host: MemoryHost,
    gateway: MockGateway,
    locator: RegistrationLocator,
}

impl TestApp {
    async fn new() -> Self {
        let host = MemoryHost::new(PluginSettings::default());
        let gateway = MockGateway::new();
        let locator = RegistrationLocator {
            event_id: 3,
            reg_form_id: 1,
            token: Uuid::new_v4(),
        };

        host.insert_registration(Registration {
            id: 7,
            event_id: 3,
            event_title: "Fusion Days".to_string(),
            reg_form_title: "Standard".to_string(),
            user_id: Some(11),
            first_name: "Ada".to_string(),
            last_name: "Byron".to_string(),
            price: dec!(10.50),
            currency: "GBP".to_string(),
            locator,
            transaction: None,
        })
        .await;
        host.save_event_settings(
            3,
            EventSettings {
                enabled: true,
                govuk_api_token: "api_test_token".to_string(),
                reference_prefix: "FUSION".to_string(),
                description: "{event_title} registration".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let shared = Arc::new(host.clone());
        let urls = PluginUrls::new("https://events.example.org/").unwrap();
        let flow = PaymentFlow::new(Arc::new(gateway.clone()), shared.clone(), shared.clone(), urls);
        let state = AppState {
            flow: Arc::new(flow),
            registrations: shared.clone(),
            settings: shared,
            environment: "development".to_string(),
            gateway_name: "mock",
        };

        TestApp {
            router: create_router(state, ADMIN_KEY.to_string()),
            host,
            gateway,
            locator,
        }
    }

    fn endpoint_uri(&self, name: &str) -> String {
        format!(
            "/event/3/registrations/1/payment/govukpay/{}?token={}",
            name, self.locator.token
        )
    }

    fn absolute(&self, name: &str) -> String {
        format!("https://events.example.org{}", self.endpoint_uri(name))
    }

    fn registration_page(&self) -> String {
        format!(
            "https://events.example.org/event/3/registrations/1/?token={}",
            self.locator.token
        )
    }

    async fn get(&self, uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn put_json(&self, uri: &str, key: Option<&str>, body: serde_json::Value) -> Response {
        let mut request = Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = key {
            request = request.header("X-Internal-Api-Key", key);
        }
        let request = request.body(Body::from(body.to_string())).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn initiate(&self) {
        self.gateway.respond_created("pay_123", NEXT_URL);
        let response = self.get(&self.endpoint_uri("init")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    async fn current_action(&self) -> Option<TransactionAction> {
        self.host
            .registration(&self.locator)
            .await
            .and_then(|r| r.transaction)
            .map(|t| t.action)
    }
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_init_redirects_to_gateway_and_records_pending() {
    let app = TestApp::new().await;
    app.gateway.respond_created("pay_123", NEXT_URL);

    let response = app.get(&app.endpoint_uri("init")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), NEXT_URL);

    let created = app.gateway.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].amount, 1050);
    assert_eq!(created[0].reference, "FUSION_E3_R7");
    assert_eq!(created[0].description, "Fusion Days registration");
    assert_eq!(created[0].return_url, app.absolute("query"));

    let transaction = app
        .host
        .registration(&app.locator)
        .await
        .and_then(|r| r.transaction)
        .unwrap();
    assert_eq!(transaction.action, TransactionAction::Pending);
    assert_eq!(transaction.payment_id(), Some("pay_123"));
}

#[tokio::test]
async fn test_init_gateway_rejection_is_bad_gateway() {
    let app = TestApp::new().await;
    app.gateway
        .respond_create_error(401, "{\"code\":\"P0920\",\"description\":\"Bad key\"}");

    let response = app.get(&app.endpoint_uri("init")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(app.current_action().await, None);

    let body = json_body(response).await;
    assert_eq!(body["code"], "PAYMENT_PROVIDER_ERROR");
    assert!(!body["error"].as_str().unwrap().contains("Bad key"));
}

#[tokio::test]
async fn test_init_disabled_method_is_not_found() {
    let app = TestApp::new().await;
    app.host
        .save_event_settings(3, EventSettings::default())
        .await
        .unwrap();

    let response = app.get(&app.endpoint_uri("init")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.gateway.created().is_empty());
}

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let app = TestApp::new().await;
    let uri = format!(
        "/event/3/registrations/1/payment/govukpay/init?token={}",
        Uuid::new_v4()
    );

    let response = app.get(&uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_token_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .get("/event/3/registrations/1/payment/govukpay/init?token=abc")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_query_success_then_success_endpoint_completes() {
    let app = TestApp::new().await;
    app.initiate().await;
    app.gateway.respond_state(true, PaymentStatus::Success);

    let response = app.get(&app.endpoint_uri("query")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), app.absolute("success"));
    assert_eq!(app.gateway.queried(), vec!["pay_123".to_string()]);
    assert_eq!(app.current_action().await, Some(TransactionAction::Pending));

    let response = app.get(&app.endpoint_uri("success")).await;
    assert_eq!(location(&response), app.registration_page());
    assert_eq!(app.current_action().await, Some(TransactionAction::Complete));

    let flashes = app.host.take_flashes(&app.locator).await;
    assert_eq!(flashes.len(), 1);
    assert_eq!(flashes[0].category, FlashCategory::Success);
}

#[tokio::test]
async fn test_query_unfinished_leaves_transaction_pending() {
    let app = TestApp::new().await;
    app.initiate().await;
    app.gateway.respond_state(false, PaymentStatus::Submitted);

    let response = app.get(&app.endpoint_uri("query")).await;
    assert_eq!(location(&response), app.registration_page());
    assert_eq!(app.current_action().await, Some(TransactionAction::Pending));
    assert_eq!(app.host.transaction_history(7).await.len(), 1);

    let flashes = app.host.take_flashes(&app.locator).await;
    assert_eq!(flashes[0].category, FlashCategory::Warning);
}

#[tokio::test]
async fn test_query_failed_and_cancelled_route_to_handlers() {
    let app = TestApp::new().await;
    app.initiate().await;
    app.gateway.respond_state(true, PaymentStatus::Failed);
    app.gateway.respond_state(true, PaymentStatus::Cancelled);

    let response = app.get(&app.endpoint_uri("query")).await;
    assert_eq!(location(&response), app.absolute("failure"));

    let response = app.get(&app.endpoint_uri("query")).await;
    assert_eq!(location(&response), app.absolute("cancel"));
}

#[tokio::test]
async fn test_query_without_transaction_is_bad_request() {
    let app = TestApp::new().await;
    let response = app.get(&app.endpoint_uri("query")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.gateway.queried().is_empty());
}

#[tokio::test]
async fn test_cancel_and_repeated_failure_are_idempotent() {
    let app = TestApp::new().await;
    app.initiate().await;

    app.get(&app.endpoint_uri("cancel")).await;
    assert_eq!(app.current_action().await, Some(TransactionAction::Cancel));

    let response = app.get(&app.endpoint_uri("failure")).await;
    assert_eq!(location(&response), app.registration_page());
    assert_eq!(app.current_action().await, Some(TransactionAction::Cancel));
    assert_eq!(app.host.transaction_history(7).await.len(), 2);
}

#[tokio::test]
async fn test_init_after_completion_is_refused() {
    let app = TestApp::new().await;
    app.initiate().await;
    app.get(&app.endpoint_uri("success")).await;
    assert_eq!(app.current_action().await, Some(TransactionAction::Complete));

    app.gateway.respond_created("pay_456", NEXT_URL);
    let response = app.get(&app.endpoint_uri("init")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["code"], "ALREADY_PAID");

    assert_eq!(app.gateway.created().len(), 1);
    let transaction = app
        .host
        .registration(&app.locator)
        .await
        .and_then(|r| r.transaction)
        .unwrap();
    assert_eq!(transaction.action, TransactionAction::Complete);
    assert_eq!(transaction.payment_id(), Some("pay_123"));
}

#[tokio::test]
async fn test_event_settings_require_admin_key() {
    let app = TestApp::new().await;
    let body = serde_json::json!({
        "govuk_api_token": "api_live_token",
        "reference_prefix": "NEW",
    });

    let response = app
        .put_json("/admin/govukpay/events/3/settings", None, body.clone())
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .put_json("/admin/govukpay/events/3/settings", Some("wrong"), body)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_event_settings_validation_errors() {
    let app = TestApp::new().await;
    let body = serde_json::json!({
        "govuk_api_token": "",
        "reference_prefix": "{bogus}",
    });

    let response = app
        .put_json("/admin/govukpay/events/3/settings", Some(ADMIN_KEY), body)
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["fields"]["govuk_api_token"], "This field is required.");
    assert_eq!(
        body["fields"]["reference_prefix"],
        "Invalid format string key: 'bogus'"
    );

    let stored = app.host.event_settings(3).await.unwrap();
    assert_eq!(stored.reference_prefix, "FUSION");
}

#[tokio::test]
async fn test_event_settings_missing_fields_are_collected() {
    let app = TestApp::new().await;
    let body = serde_json::json!({ "description": "{bogus}" });

    let response = app
        .put_json("/admin/govukpay/events/3/settings", Some(ADMIN_KEY), body)
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    assert_eq!(body["fields"]["govuk_api_token"], "This field is required.");
    assert_eq!(body["fields"]["reference_prefix"], "This field is required.");
    assert_eq!(
        body["fields"]["description"],
        "Invalid format string key: 'bogus'"
    );
}

#[tokio::test]
async fn test_plugin_settings_empty_body_is_collected() {
    let app = TestApp::new().await;
    let response = app
        .put_json("/admin/govukpay/settings", Some(ADMIN_KEY), serde_json::json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json_body(response).await["fields"]["url"],
        "This field is required."
    );
}

#[tokio::test]
async fn test_event_settings_saved() {
    let app = TestApp::new().await;
    let body = serde_json::json!({
        "enabled": true,
        "govuk_api_token": "api_live_token",
        "reference_prefix": "CONF{event_id}",
        "description": "{user_name}",
        "notification_mail": "finance@example.org",
    });

    let response = app
        .put_json("/admin/govukpay/events/3/settings", Some(ADMIN_KEY), body)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let stored = app.host.event_settings(3).await.unwrap();
    assert_eq!(stored.govuk_api_token, "api_live_token");
    assert_eq!(stored.reference_prefix, "CONF{event_id}");
    assert_eq!(stored.notification_mail.as_deref(), Some("finance@example.org"));
}

#[tokio::test]
async fn test_plugin_settings_saved() {
    let app = TestApp::new().await;
    let body = serde_json::json!({ "url": "https://pay.example.org/api/" });

    let response = app
        .put_json("/admin/govukpay/settings", Some(ADMIN_KEY), body)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["url"], "https://pay.example.org/api/");
    assert_eq!(
        app.host.plugin_settings().await.unwrap().url,
        "https://pay.example.org/api/"
    );
}

#[tokio::test]
async fn test_health_reports_gateway() {
    let app = TestApp::new().await;
    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["gateway"], "mock");
    assert_eq!(body["gateway_configured"], true);
}
