//! GOV.UK Pay payment gateway implementation
//!
//! Talks to the GOV.UK Pay public API (`/v1/payments`) with a per-event bearer
//! token. Failed calls are not retried; the registrant gets a generic failure page
//! and the gateway's error body goes to the log.

use crate::error::{AppError, AppResult, ConfigurationError, ExternalError};
use crate::payments::traits::PaymentGateway;
use crate::payments::types::{
    CreatePaymentRequest, CreatePaymentResponse, GatewayCredentials, PaymentDetails,
};
use crate::plugin::{GOVUKPAY_PAYMENTS_PATH, PROVIDER_GOVUKPAY};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{error, info};

/// GOV.UK Pay client configuration
#[derive(Debug, Clone)]
pub struct GovukPayConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GovukPayConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl GovukPayConfig {
    pub fn from_env() -> Self {
        let timeout_secs = std::env::var("GOVUKPAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        Self { timeout_secs }
    }
}

/// GOV.UK Pay gateway
pub struct GovukPayGateway {
    client: Client,
}

/// Failure of a single gateway call, mapped to an operation specific error by the caller
enum CallError {
    Status(StatusCode, String),
    Transport(String),
    Decode(String),
}

/// Resolve the payments endpoint against the configured API URL.
///
/// Uses URL-join semantics: `https://host/` and `https://host/api/` keep their path,
/// a base without trailing slash has its last segment replaced.
pub fn payments_endpoint(base_url: &str) -> AppResult<Url> {
    let invalid = |message: String| {
        AppError::from(ConfigurationError::InvalidUrl {
            url: base_url.to_string(),
            message,
        })
    };
    Url::parse(base_url)
        .map_err(|e| invalid(e.to_string()))?
        .join(GOVUKPAY_PAYMENTS_PATH)
        .map_err(|e| invalid(e.to_string()))
}

impl GovukPayGateway {
    pub fn new(config: GovukPayConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    /// Make an authenticated request to the GOV.UK Pay API
    async fn make_request<T>(
        &self,
        method: Method,
        url: Url,
        api_token: &str,
        body: Option<&CreatePaymentRequest>,
    ) -> Result<T, CallError>
    where
        T: DeserializeOwned,
    {
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(api_token)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(CallError::Status(status, response_text));
        }

        serde_json::from_str(&response_text).map_err(|e| CallError::Decode(e.to_string()))
    }
}

fn invalid_response(message: String) -> AppError {
    error!("Invalid GOV.UK Pay response: {}", message);
    AppError::from(ExternalError::InvalidResponse {
        provider: PROVIDER_GOVUKPAY,
        message,
    })
}

#[async_trait]
impl PaymentGateway for GovukPayGateway {
    fn name(&self) -> &'static str {
        PROVIDER_GOVUKPAY
    }

    async fn create_payment(
        &self,
        credentials: &GatewayCredentials,
        request: &CreatePaymentRequest,
    ) -> AppResult<CreatePaymentResponse> {
        let endpoint = payments_endpoint(&credentials.base_url)?;
        info!(
            "Initiating GOV.UK Pay payment: amount={}, reference={}",
            request.amount, request.reference
        );

        let response: CreatePaymentResponse = self
            .make_request(Method::POST, endpoint, &credentials.api_token, Some(request))
            .await
            .map_err(|e| match e {
                CallError::Status(status, body) => {
                    error!("Could not initialize payment: HTTP {}: {}", status, body);
                    AppError::from(ExternalError::PaymentInitialization {
                        provider: PROVIDER_GOVUKPAY,
                        status: Some(status.as_u16()),
                        message: body,
                    })
                }
                CallError::Transport(message) => {
                    error!("Could not initialize payment: {}", message);
                    AppError::from(ExternalError::PaymentInitialization {
                        provider: PROVIDER_GOVUKPAY,
                        status: None,
                        message,
                    })
                }
                CallError::Decode(message) => invalid_response(message),
            })?;

        info!(
            "GOV.UK Pay payment created: payment_id={}, reference={}",
            response.payment_id, request.reference
        );
        Ok(response)
    }

    async fn get_payment(
        &self,
        credentials: &GatewayCredentials,
        payment_id: &str,
    ) -> AppResult<PaymentDetails> {
        let mut url = payments_endpoint(&credentials.base_url)?;
        url.path_segments_mut()
            .map_err(|_| invalid_response("payments endpoint cannot take a path".to_string()))?
            .push(payment_id);

        let details: PaymentDetails = self
            .make_request(Method::GET, url, &credentials.api_token, None)
            .await
            .map_err(|e| match e {
                CallError::Status(status, body) => {
                    error!("Could not query payment {}: HTTP {}: {}", payment_id, status, body);
                    AppError::from(ExternalError::PaymentQuery {
                        provider: PROVIDER_GOVUKPAY,
                        payment_id: payment_id.to_string(),
                        status: Some(status.as_u16()),
                        message: body,
                    })
                }
                CallError::Transport(message) => {
                    error!("Could not query payment {}: {}", payment_id, message);
                    AppError::from(ExternalError::PaymentQuery {
                        provider: PROVIDER_GOVUKPAY,
                        payment_id: payment_id.to_string(),
                        status: None,
                        message,
                    })
                }
                CallError::Decode(message) => invalid_response(message),
            })?;

        info!(
            "GOV.UK Pay payment state: payment_id={}, finished={}, status={:?}",
            payment_id, details.state.finished, details.state.status
        );
        Ok(details)
    }
}
