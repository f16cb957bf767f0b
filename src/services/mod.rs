//! Services layer module
//!
//! External integrations (Solana RPC and program, CoinGecko, Telegram) and the
//! pure risk statistics the engine applies to their data.

pub mod alerts;
pub mod pricing;
pub mod risk;
pub mod solana;

// Re-export commonly used types
pub use alerts::{Alert, AlertGate, TelegramNotifier};
pub use pricing::CoinGeckoClient;
pub use solana::{RpcClient, SolanaService};

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::health::ComponentHealth;
use crate::config::AppConfig;
use crate::core::result::AppResult;

/// Services collection for dependency injection
#[derive(Clone, Debug)]
pub struct ServiceContainer {
    /// Solana RPC and risk program
    pub solana: Arc<SolanaService>,
    /// Price API
    pub pricing: Arc<CoinGeckoClient>,
    /// Alert delivery
    pub notifier: Arc<TelegramNotifier>,
}

impl ServiceContainer {
    /// Initialize all services
    pub fn initialize(config: &AppConfig) -> AppResult<Self> {
        tracing::info!("🚀 Initializing service container");

        let solana = Arc::new(SolanaService::new(config)?);
        let pricing = Arc::new(CoinGeckoClient::new(&config.pricing)?);
        let notifier = Arc::new(TelegramNotifier::new(&config.telegram)?);

        tracing::info!("✅ Service container initialized successfully");

        Ok(Self {
            solana,
            pricing,
            notifier,
        })
    }

    /// Health check for all services
    pub async fn health_check(&self) -> HashMap<String, ComponentHealth> {
        let mut health_status = HashMap::new();

        let rpc = self.solana.check_health().await;
        health_status.insert(rpc.name.clone(), rpc);

        let mut telegram = ComponentHealth::new("telegram", false);
        if self.notifier.is_enabled() {
            telegram.mark_healthy(Some("Telegram configured".to_string()), None);
        } else {
            telegram.mark_degraded("Telegram alerts disabled".to_string(), None);
        }
        health_status.insert(telegram.name.clone(), telegram);

        health_status
    }
}
