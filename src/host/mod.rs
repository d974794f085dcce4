//! Host application collaborators
//!
//! Registrations, transactions, settings and flash messages belong to the host. The
//! plugin reaches them only through the traits in this module.

pub mod memory;

use crate::error::AppResult;
use crate::plugin::{EventSettings, PluginSettings};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies a registration in every inbound URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationLocator {
    pub event_id: u64,
    pub reg_form_id: u64,
    pub token: Uuid,
}

impl fmt::Display for RegistrationLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}/F{}/{}", self.event_id, self.reg_form_id, self.token)
    }
}

/// State transition applied to a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionAction {
    Pending,
    Complete,
    Cancel,
    Reject,
}

impl TransactionAction {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TransactionAction::Pending)
    }
}

impl fmt::Display for TransactionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionAction::Pending => "pending",
            TransactionAction::Complete => "complete",
            TransactionAction::Cancel => "cancel",
            TransactionAction::Reject => "reject",
        };
        f.write_str(name)
    }
}

/// Payment transaction of a registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub amount: Decimal,
    pub currency: String,
    pub provider: String,
    pub action: TransactionAction,
    /// Provider data carried across the redirect round-trip
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Gateway payment id stashed by the initiation handler
    pub fn payment_id(&self) -> Option<&str> {
        self.data.get("payment_id").and_then(|v| v.as_str())
    }
}

/// A person registered for an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id: u64,
    pub event_id: u64,
    pub event_title: String,
    pub reg_form_title: String,
    pub user_id: Option<u64>,
    pub first_name: String,
    pub last_name: String,
    pub price: Decimal,
    pub currency: String,
    pub locator: RegistrationLocator,
    pub transaction: Option<Transaction>,
}

impl Registration {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Info,
    Warning,
}

/// A one-shot message shown on the next page the registrant sees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    async fn find_by_locator(&self, locator: &RegistrationLocator) -> AppResult<Option<Registration>>;
}

/// Host transaction bookkeeping
#[async_trait]
pub trait TransactionRecorder: Send + Sync {
    /// Record a transaction state change and return the resulting transaction
    async fn register_transaction(
        &self,
        registration: &Registration,
        amount: Decimal,
        currency: &str,
        action: TransactionAction,
        provider: &str,
        data: serde_json::Value,
    ) -> AppResult<Transaction>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn plugin_settings(&self) -> AppResult<PluginSettings>;
    async fn save_plugin_settings(&self, settings: PluginSettings) -> AppResult<()>;
    async fn event_settings(&self, event_id: u64) -> AppResult<EventSettings>;
    async fn save_event_settings(&self, event_id: u64, settings: EventSettings) -> AppResult<()>;
}

#[async_trait]
pub trait FlashSink: Send + Sync {
    async fn flash(&self, locator: &RegistrationLocator, flash: Flash);
}
