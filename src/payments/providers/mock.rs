//! Scripted gateway for tests and local development
//!
//! Records every request it receives and answers with whatever was queued.

use crate::error::{AppError, AppResult, ExternalError};
use crate::payments::traits::PaymentGateway;
use crate::payments::types::{
    CreatePaymentRequest, CreatePaymentResponse, GatewayCredentials, Link, PaymentDetails,
    PaymentLinks, PaymentState, PaymentStatus,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Script {
    created: Vec<CreatePaymentRequest>,
    queried: Vec<String>,
    create_responses: VecDeque<AppResult<CreatePaymentResponse>>,
    query_responses: VecDeque<AppResult<PaymentDetails>>,
}

#[derive(Clone, Default)]
pub struct MockGateway {
    script: Arc<Mutex<Script>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a successful creation answer
    pub fn respond_created(&self, payment_id: &str, next_url: &str) -> &Self {
        let response = CreatePaymentResponse {
            payment_id: payment_id.to_string(),
            links: PaymentLinks {
                next_url: Some(Link {
                    href: next_url.to_string(),
                    method: Some("GET".to_string()),
                }),
                self_link: None,
            },
            amount: None,
            reference: None,
            state: None,
        };
        self.script().create_responses.push_back(Ok(response));
        self
    }

    /// Queue a rejected creation, as a non-2xx answer would produce
    pub fn respond_create_error(&self, status: u16, body: &str) -> &Self {
        self.script()
            .create_responses
            .push_back(Err(AppError::from(ExternalError::PaymentInitialization {
                provider: "mock",
                status: Some(status),
                message: body.to_string(),
            })));
        self
    }

    pub fn respond_state(&self, finished: bool, status: PaymentStatus) -> &Self {
        self.respond_details(PaymentDetails {
            payment_id: None,
            amount: None,
            reference: None,
            state: PaymentState {
                finished,
                status,
                code: None,
                message: None,
            },
        })
    }

    pub fn respond_details(&self, details: PaymentDetails) -> &Self {
        self.script().query_responses.push_back(Ok(details));
        self
    }

    /// Requests received by `create_payment`, oldest first
    pub fn created(&self) -> Vec<CreatePaymentRequest> {
        self.script().created.clone()
    }

    /// Payment ids received by `get_payment`, oldest first
    pub fn queried(&self) -> Vec<String> {
        self.script().queried.clone()
    }
}

fn unscripted(operation: &str) -> AppError {
    AppError::from(ExternalError::InvalidResponse {
        provider: "mock",
        message: format!("no scripted response for {}", operation),
    })
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_payment(
        &self,
        _credentials: &GatewayCredentials,
        request: &CreatePaymentRequest,
    ) -> AppResult<CreatePaymentResponse> {
        let mut script = self.script();
        script.created.push(request.clone());
        script
            .create_responses
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("create_payment")))
    }

    async fn get_payment(
        &self,
        _credentials: &GatewayCredentials,
        payment_id: &str,
    ) -> AppResult<PaymentDetails> {
        let mut script = self.script();
        script.queried.push(payment_id.to_string());
        script
            .query_responses
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("get_payment")))
    }
}
