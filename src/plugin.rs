//! GOV.UK Pay plugin descriptor
//!
//! Provider identity, default settings for both settings scopes, and the endpoints
//! the plugin mounts into the host.

use serde::{Deserialize, Serialize};

/// Payment provider identifier recorded on every transaction
pub const PROVIDER_GOVUKPAY: &str = "govukpay";

/// Payments resource, relative to the configured API URL
pub const GOVUKPAY_PAYMENTS_PATH: &str = "v1/payments";

pub const DEFAULT_METHOD_NAME: &str = "GovUK Pay";
pub const DEFAULT_API_URL: &str = "https://publicapi.payments.service.gov.uk/";

/// Plugin-global settings shared by every event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    pub method_name: String,
    /// GOV.UK Pay API base URL
    pub url: String,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            method_name: DEFAULT_METHOD_NAME.to_string(),
            url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// Per-event settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    pub enabled: bool,
    pub method_name: String,
    pub govuk_api_token: String,
    /// Template, see [`crate::forms::FormatField`]
    pub reference_prefix: String,
    /// Template, see [`crate::forms::FormatField`]
    pub description: String,
    pub notification_mail: Option<String>,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            method_name: DEFAULT_METHOD_NAME.to_string(),
            govuk_api_token: String::new(),
            reference_prefix: String::new(),
            description: String::new(),
            notification_mail: None,
        }
    }
}

// The API token stays out of logs.
impl std::fmt::Debug for EventSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSettings")
            .field("enabled", &self.enabled)
            .field("method_name", &self.method_name)
            .field("govuk_api_token", &"<redacted>")
            .field("reference_prefix", &self.reference_prefix)
            .field("description", &self.description)
            .field("notification_mail", &self.notification_mail)
            .finish()
    }
}

/// Endpoints the plugin exposes, all relative to a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Start a payment and send the registrant to the hosted payment page
    Init,
    /// Return URL for the gateway; looks up the payment state
    Query,
    Success,
    Cancel,
    Failure,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::Init,
        Endpoint::Query,
        Endpoint::Success,
        Endpoint::Cancel,
        Endpoint::Failure,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Init => "init",
            Endpoint::Query => "query",
            Endpoint::Success => "success",
            Endpoint::Cancel => "cancel",
            Endpoint::Failure => "failure",
        }
    }

    /// Axum route pattern
    pub fn route(self) -> String {
        self.path_with(":event_id", ":reg_form_id")
    }

    /// Concrete path of the endpoint for one registration form
    pub fn path(self, event_id: u64, reg_form_id: u64) -> String {
        self.path_with(&event_id.to_string(), &reg_form_id.to_string())
    }

    fn path_with(self, event_id: &str, reg_form_id: &str) -> String {
        format!(
            "/event/{}/registrations/{}/payment/{}/{}",
            event_id,
            reg_form_id,
            PROVIDER_GOVUKPAY,
            self.name()
        )
    }
}
