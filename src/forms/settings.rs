use crate::forms::{FieldError, FormatField, DEFAULT_FIELD_MAP};
use crate::plugin::{EventSettings, PluginSettings, DEFAULT_METHOD_NAME};
use regex::Regex;
use reqwest::Url;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::fmt;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern")
});

const TEMPLATE_MAX_LENGTH: usize = 80;
const NOTIFICATION_MAIL_MAX_LENGTH: usize = 50;

/// All failing fields of a submitted form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub fields: Vec<(&'static str, FieldError)>,
}

impl FormErrors {
    fn check(&mut self, field: &'static str, result: Result<(), FieldError>) {
        if let Err(e) = result {
            self.fields.push((field, e));
        }
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, e)| e)
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .fields
            .iter()
            .map(|(field, e)| format!("{}: {}", field, e))
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for FormErrors {}

/// Serialized as a `field -> message` object
impl Serialize for FormErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, error) in &self.fields {
            map.serialize_entry(field, &error.to_string())?;
        }
        map.end()
    }
}

fn required(value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::Required);
    }
    Ok(())
}

/// Configuration form for the plugin across all events
#[derive(Debug, Clone, Deserialize)]
pub struct PluginSettingsForm {
    /// Name of the payment method shown to registrants
    #[serde(default = "default_method_name")]
    pub method_name: String,
    /// URL to contact the GOV.UK Pay JSON API
    #[serde(default)]
    pub url: String,
}

fn default_method_name() -> String {
    DEFAULT_METHOD_NAME.to_string()
}

impl PluginSettingsForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        errors.check("method_name", required(&self.method_name));
        errors.check("url", required(&self.url).and_then(|_| validate_api_url(&self.url)));
        errors.into_result()
    }

    pub fn apply_to(self, settings: &mut PluginSettings) {
        settings.method_name = self.method_name;
        settings.url = self.url;
    }
}

fn validate_api_url(value: &str) -> Result<(), FieldError> {
    let url = Url::parse(value).map_err(|e| FieldError::InvalidUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(FieldError::InvalidUrl(format!("unsupported scheme '{}'", other))),
    }
}

/// Configuration form for the plugin for a specific event
#[derive(Clone, Deserialize)]
pub struct EventSettingsForm {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_method_name")]
    pub method_name: String,
    /// GOV.UK Pay API key for this event
    #[serde(default)]
    pub govuk_api_token: String,
    /// Prefix added to each payment reference for identification by finance
    #[serde(default)]
    pub reference_prefix: String,
    /// Human readable description presented to the registrant
    #[serde(default)]
    pub description: String,
    /// Receives notifications of transactions, independent of host notifications
    #[serde(default)]
    pub notification_mail: Option<String>,
}

impl fmt::Debug for EventSettingsForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSettingsForm")
            .field("enabled", &self.enabled)
            .field("method_name", &self.method_name)
            .field("govuk_api_token", &"<redacted>")
            .field("reference_prefix", &self.reference_prefix)
            .field("description", &self.description)
            .field("notification_mail", &self.notification_mail)
            .finish()
    }
}

impl EventSettingsForm {
    /// Help text of the description field
    pub fn description_help() -> String {
        let placeholders: Vec<String> = DEFAULT_FIELD_MAP
            .iter()
            .map(|(key, _)| format!("{{{}}}", key))
            .collect();
        format!(
            "The description of each payment in a human readable way. \
             It is presented to the registrant during the transaction with GOV.UK Pay. \
             Supported placeholders: {}",
            placeholders.join(", ")
        )
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let template = FormatField::new().with_max_length(TEMPLATE_MAX_LENGTH);
        let mut errors = FormErrors::default();

        errors.check("method_name", required(&self.method_name));
        errors.check("govuk_api_token", required(&self.govuk_api_token));
        errors.check(
            "reference_prefix",
            required(&self.reference_prefix).and_then(|_| template.validate(&self.reference_prefix)),
        );
        errors.check("description", template.validate(&self.description));
        if let Some(mail) = self.notification_mail.as_deref().filter(|m| !m.is_empty()) {
            errors.check("notification_mail", validate_notification_mail(mail));
        }

        errors.into_result()
    }

    pub fn apply_to(self, settings: &mut EventSettings) {
        settings.enabled = self.enabled;
        settings.method_name = self.method_name;
        settings.govuk_api_token = self.govuk_api_token;
        settings.reference_prefix = self.reference_prefix;
        settings.description = self.description;
        settings.notification_mail = self.notification_mail.filter(|m| !m.is_empty());
    }
}

fn validate_notification_mail(mail: &str) -> Result<(), FieldError> {
    if !EMAIL.is_match(mail) {
        return Err(FieldError::InvalidEmail);
    }
    if mail.chars().count() > NOTIFICATION_MAIL_MAX_LENGTH {
        return Err(FieldError::LengthExceeded {
            max: NOTIFICATION_MAIL_MAX_LENGTH,
        });
    }
    Ok(())
}
