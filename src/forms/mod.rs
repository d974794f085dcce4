//! Settings forms for both settings scopes
//!
//! The host renders these forms in its admin UI; validation runs when settings are
//! saved so that templates never fail at payment time.

mod format_field;
mod settings;

pub use format_field::{FormatField, DEFAULT_FIELD_MAP, ID_SAFE_FIELD_MAP};
pub use settings::{EventSettingsForm, FormErrors, PluginSettingsForm};

use thiserror::Error;

/// Validation failure of a single form field
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("This field is required.")]
    Required,
    #[error("Invalid format string key: {0}")]
    InvalidKey(String),
    #[error("Malformed format string: {0}")]
    Malformed(String),
    #[error("Format string too long: shortest replacement with {len}, expected {max}")]
    TooLong { len: usize, max: usize },
    #[error("This field may only contain alphanumeric chars, dots, colons, hyphens and underscores.")]
    NotIdSafe,
    #[error("Invalid email address.")]
    InvalidEmail,
    #[error("Field must be at most {max} characters long.")]
    LengthExceeded { max: usize },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
