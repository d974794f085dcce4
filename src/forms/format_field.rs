use crate::format::{format_template, FormatMap, TemplateError};
use crate::forms::FieldError;
use regex::Regex;
use std::sync::LazyLock;

static ID_SAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.:_-]+$").expect("valid id-safe pattern"));

/// Default placeholders used to test the length after formatting
pub const DEFAULT_FIELD_MAP: [(&str, &str); 8] = [
    ("user_id", "12345"),
    ("user_name", "Jane Whiteacre"),
    ("user_firstname", "Jane"),
    ("user_lastname", "Whiteacre"),
    ("event_id", "12345"),
    ("event_title", "Placeholder: The Event"),
    ("registration_id", "12345"),
    ("regform_title", "EarlyBird Registration"),
];

/// Placeholders that only ever expand to identifiers
pub const ID_SAFE_FIELD_MAP: [(&str, &str); 3] = [
    ("user_id", "12345"),
    ("event_id", "12345"),
    ("registration_id", "12345"),
];

/// Validator for format fields, i.e. strings with `{key}` placeholders.
///
/// On validation the field is test-formatted against a sample mapping. This catches
/// malformed templates and illegal keys; the optional `max_length` is checked against
/// the test-formatted result, which stands in for an average sized input.
#[derive(Debug, Clone)]
pub struct FormatField {
    max_length: Option<usize>,
    id_safe: bool,
    field_map: FormatMap,
}

impl Default for FormatField {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatField {
    pub fn new() -> Self {
        Self {
            max_length: None,
            id_safe: false,
            field_map: DEFAULT_FIELD_MAP.into_iter().collect(),
        }
    }

    /// Only allow placeholders safe for an identifier argument
    pub fn id_safe() -> Self {
        Self {
            max_length: None,
            id_safe: true,
            field_map: ID_SAFE_FIELD_MAP.into_iter().collect(),
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn validate(&self, data: &str) -> Result<(), FieldError> {
        if data.is_empty() {
            return Ok(());
        }

        let test_format = format_template(data, &self.field_map).map_err(|e| match e {
            TemplateError::UnknownKey(_) => FieldError::InvalidKey(e.to_string()),
            TemplateError::Malformed(_) => FieldError::Malformed(e.to_string()),
        })?;

        let len = test_format.chars().count();
        if let Some(max) = self.max_length {
            if len > max {
                return Err(FieldError::TooLong { len, max });
            }
        }

        if self.id_safe && !ID_SAFE.is_match(&test_format) {
            return Err(FieldError::NotIdSafe);
        }

        Ok(())
    }
}
