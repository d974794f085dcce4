//! GOV.UK Pay request and response bodies

use serde::{Deserialize, Serialize};

/// Body of `POST /v1/payments`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    /// Amount in the smallest currency unit (pence for GBP)
    pub amount: i64,
    /// Reconciliation reference, `{prefix}_E{event_id}_R{registration_id}`
    pub reference: String,
    pub description: String,
    pub language: String,
    pub delayed_capture: bool,
    /// Where the gateway sends the registrant back to
    pub return_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLinks {
    /// Hosted payment page; absent once the payment is finished
    #[serde(default)]
    pub next_url: Option<Link>,
    #[serde(rename = "self", default)]
    pub self_link: Option<Link>,
}

/// Status reported in a payment's `state`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Created,
    Started,
    Submitted,
    Capturable,
    Success,
    Failed,
    Cancelled,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentState {
    pub finished: bool,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST /v1/payments`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentResponse {
    pub payment_id: String,
    #[serde(rename = "_links", default)]
    pub links: PaymentLinks,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub state: Option<PaymentState>,
}

impl CreatePaymentResponse {
    /// URL of the hosted payment page
    pub fn next_url(&self) -> Option<&str> {
        self.links.next_url.as_ref().map(|link| link.href.as_str())
    }
}

/// Response of `GET /v1/payments/{payment_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub reference: Option<String>,
    pub state: PaymentState,
}

/// Connection details for one gateway account
#[derive(Clone)]
pub struct GatewayCredentials {
    /// API base URL, e.g. `https://publicapi.payments.service.gov.uk/`
    pub base_url: String,
    pub api_token: String,
}

impl std::fmt::Debug for GatewayCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayCredentials")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_response_links() {
        let response: CreatePaymentResponse = serde_json::from_value(json!({
            "payment_id": "hu20sqlact5260q2nanm0q8u93",
            "amount": 1050,
            "state": {"status": "created", "finished": false},
            "_links": {
                "self": {"href": "https://publicapi.payments.service.gov.uk/v1/payments/hu20", "method": "GET"},
                "next_url": {"href": "https://card.payments.service.gov.uk/secure/ef1b6ff1", "method": "GET"}
            }
        }))
        .unwrap();

        assert_eq!(response.next_url(), Some("https://card.payments.service.gov.uk/secure/ef1b6ff1"));
        assert_eq!(response.state.unwrap().status, PaymentStatus::Created);
    }

    #[test]
    fn test_state_without_status() {
        let details: PaymentDetails =
            serde_json::from_value(json!({"state": {"finished": false}})).unwrap();
        assert!(!details.state.finished);
        assert_eq!(details.state.status, PaymentStatus::Unknown);
    }

    #[test]
    fn test_unrecognized_status() {
        let state: PaymentState =
            serde_json::from_value(json!({"finished": true, "status": "refunded"})).unwrap();
        assert_eq!(state.status, PaymentStatus::Unknown);
    }

    #[test]
    fn test_request_body_shape() {
        let request = CreatePaymentRequest {
            amount: 1050,
            reference: "FD_E3_R7".to_string(),
            description: "Fusion Days".to_string(),
            language: "en".to_string(),
            delayed_capture: false,
            return_url: "https://events.example.org/return".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "amount": 1050,
                "reference": "FD_E3_R7",
                "description": "Fusion Days",
                "language": "en",
                "delayed_capture": false,
                "return_url": "https://events.example.org/return"
            })
        );
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let credentials = GatewayCredentials {
            base_url: "https://publicapi.payments.service.gov.uk/".to_string(),
            api_token: "api_live_secret".to_string(),
        };
        assert!(!format!("{:?}", credentials).contains("api_live_secret"));
    }
}
