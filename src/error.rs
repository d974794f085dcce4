//! Application error types
//!
//! Every failure ends at the request-handler boundary, where [`AppError`] is turned
//! into a user-facing response. Nothing here is retried.

use crate::currency::CurrencyError;
use crate::format::TemplateError;
use crate::forms::FormErrors;
use crate::host::RegistrationLocator;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::error;

/// Result type for plugin operations
pub type AppResult<T> = Result<T, AppError>;

/// Misconfigured plugin or event settings
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Invalid template in setting '{setting}': {source}")]
    Template {
        setting: &'static str,
        #[source]
        source: TemplateError,
    },
    #[error("Setting '{0}' is not configured")]
    MissingSetting(&'static str),
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Failures talking to the payment gateway
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExternalError {
    #[error("Could not initialize payment")]
    PaymentInitialization {
        provider: &'static str,
        status: Option<u16>,
        message: String,
    },
    #[error("Could not query payment {payment_id}")]
    PaymentQuery {
        provider: &'static str,
        payment_id: String,
        status: Option<u16>,
        message: String,
    },
    #[error("Invalid {provider} response: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },
}

/// Requests that do not match the state of the registration
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Registration {0} not found")]
    RegistrationNotFound(RegistrationLocator),
    #[error("GOV.UK Pay is not enabled for event {0}")]
    MethodDisabled(u64),
    #[error("Registration {0} has no transaction")]
    MissingTransaction(u64),
    #[error("Transaction of registration {0} carries no gateway payment id")]
    MissingPaymentId(u64),
    #[error("Registration {0} has already been paid")]
    AlreadyPaid(u64),
}

#[derive(Debug, Error)]
pub enum AppErrorKind {
    #[error(transparent)]
    Currency(#[from] CurrencyError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    External(#[from] ExternalError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("Invalid settings: {0}")]
    Validation(#[from] FormErrors),
}

#[derive(Debug)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub context: Option<String>,
}

impl AppError {
    pub fn new(kind: impl Into<AppErrorKind>) -> Self {
        Self {
            kind: kind.into(),
            context: None,
        }
    }

    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn status_code(&self) -> StatusCode {
        match &self.kind {
            AppErrorKind::Currency(_) => StatusCode::NOT_IMPLEMENTED,
            AppErrorKind::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppErrorKind::External(_) => StatusCode::BAD_GATEWAY,
            AppErrorKind::Domain(DomainError::RegistrationNotFound(_))
            | AppErrorKind::Domain(DomainError::MethodDisabled(_)) => StatusCode::NOT_FOUND,
            AppErrorKind::Domain(DomainError::AlreadyPaid(_)) => StatusCode::CONFLICT,
            AppErrorKind::Domain(_) => StatusCode::BAD_REQUEST,
            AppErrorKind::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn code(&self) -> &'static str {
        match &self.kind {
            AppErrorKind::Currency(_) => "CURRENCY_NOT_SUPPORTED",
            AppErrorKind::Configuration(_) => "CONFIGURATION_ERROR",
            AppErrorKind::External(_) => "PAYMENT_PROVIDER_ERROR",
            AppErrorKind::Domain(DomainError::RegistrationNotFound(_)) => "NOT_FOUND",
            AppErrorKind::Domain(DomainError::MethodDisabled(_)) => "NOT_FOUND",
            AppErrorKind::Domain(DomainError::AlreadyPaid(_)) => "ALREADY_PAID",
            AppErrorKind::Domain(_) => "BAD_REQUEST",
            AppErrorKind::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

impl From<CurrencyError> for AppError {
    fn from(error: CurrencyError) -> Self {
        AppError::new(error)
    }
}

impl From<ConfigurationError> for AppError {
    fn from(error: ConfigurationError) -> Self {
        AppError::new(error)
    }
}

impl From<ExternalError> for AppError {
    fn from(error: ExternalError) -> Self {
        AppError::new(error)
    }
}

impl From<DomainError> for AppError {
    fn from(error: DomainError) -> Self {
        AppError::new(error)
    }
}

impl From<FormErrors> for AppError {
    fn from(errors: FormErrors) -> Self {
        AppError::new(errors)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{} ({})", self.kind, context),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FormErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        // Configuration details stay in the log, the registrant sees a generic failure.
        let message = match &self.kind {
            AppErrorKind::Configuration(_) => "Payment could not be started".to_string(),
            AppErrorKind::External(ExternalError::InvalidResponse { .. }) => {
                "Invalid payment provider response".to_string()
            }
            kind => kind.to_string(),
        };
        let fields = match self.kind {
            AppErrorKind::Validation(errors) => Some(errors),
            _ => None,
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            fields,
        };
        (status, Json(body)).into_response()
    }
}
