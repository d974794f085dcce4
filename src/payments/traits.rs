//! Payment gateway trait definitions

use crate::error::AppResult;
use crate::payments::types::{
    CreatePaymentRequest, CreatePaymentResponse, GatewayCredentials, PaymentDetails,
};
use async_trait::async_trait;

/// Trait for payment gateway implementations
///
/// Credentials are passed on every call because the API token is configured per
/// event, not per process.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    /// Create a payment and return the hosted payment page to send the user to
    ///
    /// # Errors
    /// * `ExternalError::PaymentInitialization` on a non-2xx answer or transport failure
    /// * `ExternalError::InvalidResponse` when the answer cannot be decoded
    async fn create_payment(
        &self,
        credentials: &GatewayCredentials,
        request: &CreatePaymentRequest,
    ) -> AppResult<CreatePaymentResponse>;

    /// Fetch the current state of a payment
    async fn get_payment(
        &self,
        credentials: &GatewayCredentials,
        payment_id: &str,
    ) -> AppResult<PaymentDetails>;
}
