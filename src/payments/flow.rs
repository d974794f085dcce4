//! Payment initiation and status reconciliation
//!
//! A transaction driven by this flow moves `(none) -> pending -> complete | cancel |
//! reject`. The query step may see `pending` any number of times without changing it.
//! Terminal transitions are idempotent: once a transaction is terminal, repeated
//! callbacks record nothing.

use crate::currency::to_small_currency;
use crate::error::{AppResult, ConfigurationError, DomainError, ExternalError};
use crate::format::{format_template, FormatMap};
use crate::host::{
    Flash, FlashCategory, FlashSink, Registration, Transaction, TransactionAction,
    TransactionRecorder,
};
use crate::payments::traits::PaymentGateway;
use crate::payments::types::{CreatePaymentRequest, GatewayCredentials, PaymentStatus};
use crate::plugin::{Endpoint, EventSettings, PluginSettings, PROVIDER_GOVUKPAY};
use crate::urls::PluginUrls;
use std::sync::Arc;
use tracing::{info, warn};

const MSG_PROCESSING: &str = "Your payment is still processing. If the \"Pending\" payment \
                              status does not update, please contact the event organisers.";
const MSG_NOT_CONFIRMED: &str =
    "Your payment could not be confirmed. Please contact the event organisers.";
const MSG_CONFIRMED: &str = "Your payment has been confirmed.";
const MSG_CANCELLED: &str = "You cancelled the payment.";
const MSG_FAILED: &str = "Your payment has failed.";
const MSG_ALREADY_PROCESSED: &str = "This payment has already been processed.";

/// Settings in effect for one request
#[derive(Debug, Clone, Copy)]
pub struct SettingsScope<'a> {
    pub plugin: &'a PluginSettings,
    pub event: &'a EventSettings,
}

impl SettingsScope<'_> {
    fn credentials(&self) -> AppResult<GatewayCredentials> {
        if self.event.govuk_api_token.trim().is_empty() {
            return Err(ConfigurationError::MissingSetting("govuk_api_token").into());
        }
        Ok(GatewayCredentials {
            base_url: self.plugin.url.clone(),
            api_token: self.event.govuk_api_token.clone(),
        })
    }
}

/// Placeholder values describing a registration
pub fn registration_format_map(registration: &Registration) -> FormatMap {
    let mut map = FormatMap::new();
    map.insert(
        "user_id",
        registration.user_id.map(|id| id.to_string()).unwrap_or_default(),
    )
    .insert("user_name", registration.full_name())
    .insert("user_firstname", &registration.first_name)
    .insert("user_lastname", &registration.last_name)
    .insert("event_id", registration.event_id)
    .insert("event_title", &registration.event_title)
    .insert("registration_id", registration.id)
    .insert("regform_title", &registration.reg_form_title);
    map
}

fn format_setting(setting: &'static str, template: &str, map: &FormatMap) -> AppResult<String> {
    format_template(template, map)
        .map_err(|source| ConfigurationError::Template { setting, source }.into())
}

pub struct PaymentFlow {
    gateway: Arc<dyn PaymentGateway>,
    transactions: Arc<dyn TransactionRecorder>,
    flashes: Arc<dyn FlashSink>,
    urls: PluginUrls,
}

impl PaymentFlow {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        transactions: Arc<dyn TransactionRecorder>,
        flashes: Arc<dyn FlashSink>,
        urls: PluginUrls,
    ) -> Self {
        Self {
            gateway,
            transactions,
            flashes,
            urls,
        }
    }

    pub fn urls(&self) -> &PluginUrls {
        &self.urls
    }

    async fn flash(&self, registration: &Registration, category: FlashCategory, message: &str) {
        self.flashes
            .flash(
                &registration.locator,
                Flash {
                    category,
                    message: message.to_string(),
                },
            )
            .await;
    }

    /// Parameters for creating the gateway payment of a registration
    pub fn transaction_parameters(
        &self,
        registration: &Registration,
        event: &EventSettings,
    ) -> AppResult<CreatePaymentRequest> {
        let format_map = registration_format_map(registration);
        let description = format_setting("description", &event.description, &format_map)?;
        let reference_prefix =
            format_setting("reference_prefix", &event.reference_prefix, &format_map)?;

        Ok(CreatePaymentRequest {
            amount: to_small_currency(registration.price, &registration.currency)?,
            reference: format!(
                "{}_E{}_R{}",
                reference_prefix, registration.event_id, registration.id
            ),
            description,
            language: "en".to_string(),
            delayed_capture: false,
            return_url: self.urls.endpoint(Endpoint::Query, &registration.locator),
        })
    }

    /// Create the gateway payment, record it as pending and return the hosted page URL
    pub async fn initiate(
        &self,
        registration: &Registration,
        settings: SettingsScope<'_>,
    ) -> AppResult<String> {
        if !settings.event.enabled {
            return Err(DomainError::MethodDisabled(registration.event_id).into());
        }
        if let Some(transaction) = &registration.transaction {
            if transaction.action == TransactionAction::Complete {
                warn!(
                    "Refusing new payment for registration {}: already paid",
                    registration.id
                );
                return Err(DomainError::AlreadyPaid(registration.id).into());
            }
        }

        let request = self.transaction_parameters(registration, settings.event)?;
        let credentials = settings.credentials()?;
        let response = self.gateway.create_payment(&credentials, &request).await?;

        let payment_url = response
            .next_url()
            .ok_or_else(|| ExternalError::InvalidResponse {
                provider: PROVIDER_GOVUKPAY,
                message: format!("payment {} has no next_url link", response.payment_id),
            })?
            .to_string();

        self.transactions
            .register_transaction(
                registration,
                registration.price,
                &registration.currency,
                TransactionAction::Pending,
                PROVIDER_GOVUKPAY,
                serde_json::json!({ "payment_id": response.payment_id }),
            )
            .await?;

        info!(
            "Payment pending: registration={}, payment_id={}",
            registration.id, response.payment_id
        );
        Ok(payment_url)
    }

    /// Look up the gateway state of the pending payment and pick the next page
    pub async fn confirm(
        &self,
        registration: &Registration,
        settings: SettingsScope<'_>,
    ) -> AppResult<String> {
        let (_, payment_id) = current_transaction(registration)?;
        let credentials = settings.credentials()?;
        let details = self.gateway.get_payment(&credentials, payment_id).await?;
        let locator = &registration.locator;

        if !details.state.finished {
            self.flash(registration, FlashCategory::Warning, MSG_PROCESSING).await;
            return Ok(self.urls.registration_page(locator));
        }

        match details.state.status {
            PaymentStatus::Success => {
                if let Some((expected, paid)) = amount_mismatch(registration, details.amount) {
                    warn!(
                        "Payment amount inconsistency: registration={}, expected={}, paid={} ({})",
                        registration.id, expected, paid, registration.currency
                    );
                }
                Ok(self.urls.endpoint(Endpoint::Success, locator))
            }
            PaymentStatus::Failed => Ok(self.urls.endpoint(Endpoint::Failure, locator)),
            PaymentStatus::Cancelled => Ok(self.urls.endpoint(Endpoint::Cancel, locator)),
            other => {
                warn!(
                    "Payment {} finished with unexpected status {:?}: registration={}",
                    payment_id, other, registration.id
                );
                self.flash(registration, FlashCategory::Warning, MSG_NOT_CONFIRMED).await;
                Ok(self.urls.registration_page(locator))
            }
        }
    }

    /// Mark the payment complete with the registration's price
    pub async fn complete(&self, registration: &Registration) -> AppResult<String> {
        self.finish(
            registration,
            TransactionAction::Complete,
            FlashCategory::Success,
            MSG_CONFIRMED,
        )
        .await
    }

    pub async fn cancel(&self, registration: &Registration) -> AppResult<String> {
        self.finish(
            registration,
            TransactionAction::Cancel,
            FlashCategory::Info,
            MSG_CANCELLED,
        )
        .await
    }

    pub async fn fail(&self, registration: &Registration) -> AppResult<String> {
        self.finish(
            registration,
            TransactionAction::Reject,
            FlashCategory::Info,
            MSG_FAILED,
        )
        .await
    }

    async fn finish(
        &self,
        registration: &Registration,
        action: TransactionAction,
        category: FlashCategory,
        message: &str,
    ) -> AppResult<String> {
        let (transaction, payment_id) =
            current_transaction(registration).map_err(|e| e.with_context(action.to_string()))?;
        let page = self.urls.registration_page(&registration.locator);

        if transaction.action.is_terminal() {
            warn!(
                "Ignoring {} for registration {}: transaction already {}",
                action, registration.id, transaction.action
            );
            self.flash(registration, FlashCategory::Info, MSG_ALREADY_PROCESSED).await;
            return Ok(page);
        }

        // A completed payment is booked at the registration's price, cancellations and
        // rejections keep what the pending transaction recorded.
        let (amount, currency) = match action {
            TransactionAction::Complete => (registration.price, registration.currency.as_str()),
            _ => (transaction.amount, transaction.currency.as_str()),
        };

        self.transactions
            .register_transaction(
                registration,
                amount,
                currency,
                action,
                PROVIDER_GOVUKPAY,
                serde_json::json!({ "payment_id": payment_id }),
            )
            .await?;

        info!(
            "Payment {}: registration={}, payment_id={}",
            action, registration.id, payment_id
        );
        self.flash(registration, category, message).await;
        Ok(page)
    }
}

/// `(expected, paid)` minor units when the gateway reports a different amount
fn amount_mismatch(registration: &Registration, paid: Option<i64>) -> Option<(i64, i64)> {
    let paid = paid?;
    let expected = to_small_currency(registration.price, &registration.currency).ok()?;
    (paid != expected).then_some((expected, paid))
}

fn current_transaction(registration: &Registration) -> AppResult<(&Transaction, &str)> {
    let transaction = registration
        .transaction
        .as_ref()
        .ok_or(DomainError::MissingTransaction(registration.id))?;
    let payment_id = transaction
        .payment_id()
        .ok_or(DomainError::MissingPaymentId(registration.id))?;
    Ok((transaction, payment_id))
}
