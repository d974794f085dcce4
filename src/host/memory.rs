//! In-memory host used by the standalone server and tests

use crate::error::AppResult;
use crate::host::{
    Flash, FlashSink, Registration, RegistrationLocator, RegistrationRepository, SettingsStore,
    Transaction, TransactionAction, TransactionRecorder,
};
use crate::plugin::{EventSettings, PluginSettings};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct State {
    registrations: HashMap<RegistrationLocator, Registration>,
    /// Every recorded transaction per registration, oldest first
    history: HashMap<u64, Vec<Transaction>>,
    plugin_settings: PluginSettings,
    event_settings: HashMap<u64, EventSettings>,
    flashes: HashMap<RegistrationLocator, Vec<Flash>>,
}

/// Host state kept behind a single lock
#[derive(Clone, Default)]
pub struct MemoryHost {
    state: Arc<RwLock<State>>,
}

impl MemoryHost {
    pub fn new(plugin_settings: PluginSettings) -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                plugin_settings,
                ..Default::default()
            })),
        }
    }

    pub async fn insert_registration(&self, registration: Registration) {
        let mut state = self.state.write().await;
        state.registrations.insert(registration.locator, registration);
    }

    pub async fn registration(&self, locator: &RegistrationLocator) -> Option<Registration> {
        self.state.read().await.registrations.get(locator).cloned()
    }

    pub async fn transaction_history(&self, registration_id: u64) -> Vec<Transaction> {
        self.state
            .read()
            .await
            .history
            .get(&registration_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Drain the flashes queued for a registration
    pub async fn take_flashes(&self, locator: &RegistrationLocator) -> Vec<Flash> {
        self.state
            .write()
            .await
            .flashes
            .remove(locator)
            .unwrap_or_default()
    }
}

#[async_trait]
impl RegistrationRepository for MemoryHost {
    async fn find_by_locator(&self, locator: &RegistrationLocator) -> AppResult<Option<Registration>> {
        Ok(self.registration(locator).await)
    }
}

#[async_trait]
impl TransactionRecorder for MemoryHost {
    async fn register_transaction(
        &self,
        registration: &Registration,
        amount: Decimal,
        currency: &str,
        action: TransactionAction,
        provider: &str,
        data: serde_json::Value,
    ) -> AppResult<Transaction> {
        let transaction = Transaction {
            amount,
            currency: currency.to_string(),
            provider: provider.to_string(),
            action,
            data,
            timestamp: Utc::now(),
        };

        let mut state = self.state.write().await;
        if let Some(stored) = state.registrations.get_mut(&registration.locator) {
            stored.transaction = Some(transaction.clone());
        }
        state
            .history
            .entry(registration.id)
            .or_default()
            .push(transaction.clone());

        debug!(
            "Recorded transaction: registration={}, action={}, amount={} {}",
            registration.id, action, amount, currency
        );
        Ok(transaction)
    }
}

#[async_trait]
impl SettingsStore for MemoryHost {
    async fn plugin_settings(&self) -> AppResult<PluginSettings> {
        Ok(self.state.read().await.plugin_settings.clone())
    }

    async fn save_plugin_settings(&self, settings: PluginSettings) -> AppResult<()> {
        self.state.write().await.plugin_settings = settings;
        Ok(())
    }

    async fn event_settings(&self, event_id: u64) -> AppResult<EventSettings> {
        Ok(self
            .state
            .read()
            .await
            .event_settings
            .get(&event_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_event_settings(&self, event_id: u64, settings: EventSettings) -> AppResult<()> {
        self.state.write().await.event_settings.insert(event_id, settings);
        Ok(())
    }
}

#[async_trait]
impl FlashSink for MemoryHost {
    async fn flash(&self, locator: &RegistrationLocator, flash: Flash) {
        self.state
            .write()
            .await
            .flashes
            .entry(*locator)
            .or_default()
            .push(flash);
    }
}
