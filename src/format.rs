//! Strict `{placeholder}` formatting for settings templates
//!
//! Templates such as the payment description are written by event organisers and
//! filled from registration data. Only plain `{name}` fields are understood; anything
//! else is rejected so a template that saved cleanly also formats cleanly at payment
//! time.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("'{0}'")]
    UnknownKey(String),
    #[error("{0}")]
    Malformed(String),
}

/// Values available to a template, keyed by placeholder name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatMap(BTreeMap<String, String>);

impl FormatMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.0.insert(key.into(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for FormatMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

fn validate_field_name(name: &str) -> Result<(), TemplateError> {
    if name.is_empty() {
        return Err(TemplateError::Malformed(
            "empty fields are not supported, use a named placeholder".to_string(),
        ));
    }
    if name.chars().all(|c| c.is_ascii_digit()) {
        return Err(TemplateError::Malformed(format!(
            "positional field '{{{name}}}' is not supported"
        )));
    }
    if let Some(c) = name.chars().find(|c| matches!(c, ':' | '!')) {
        return Err(TemplateError::Malformed(format!(
            "unsupported '{c}' in field '{{{name}}}'"
        )));
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(TemplateError::Malformed(format!("invalid field name '{name}'")));
    }
    Ok(())
}

/// Substitute every `{name}` in `template` from `values`.
///
/// `{{` and `}}` produce literal braces.
pub fn format_template(template: &str, values: &FormatMap) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => {
                            return Err(TemplateError::Malformed(
                                "unexpected '{' in field name".to_string(),
                            ))
                        }
                        Some(c) => name.push(c),
                        None => {
                            return Err(TemplateError::Malformed(
                                "expected '}' before end of string".to_string(),
                            ))
                        }
                    }
                }
                validate_field_name(&name)?;
                let value = values
                    .get(&name)
                    .ok_or_else(|| TemplateError::UnknownKey(name.clone()))?;
                out.push_str(value);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => {
                return Err(TemplateError::Malformed(
                    "single '}' encountered in format string".to_string(),
                ))
            }
            c => out.push(c),
        }
    }

    Ok(out)
}
