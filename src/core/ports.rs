//! Contracts between the polling engine and the outside world
//!
//! The engine and the HTTP API only talk to these traits. Concrete
//! implementations live in `services` (Solana RPC, CoinGecko, Telegram); tests
//! substitute mocks.

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

use super::result::AppResult;
use super::types::{RiskSnapshotRecord, TrackedAsset, WalletBalances};
use crate::services::alerts::Alert;

/// Live and historical price data
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Current price per asset symbol
    async fn live_prices(
        &self,
        assets: &[TrackedAsset],
    ) -> AppResult<std::collections::HashMap<String, f64>>;

    /// Historical close prices for one asset, oldest first
    async fn price_history(&self, asset: &TrackedAsset) -> AppResult<Vec<f64>>;
}

/// The monitored wallet on the ledger
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Native and SPL token balances of the monitored wallet
    async fn wallet_balances(&self) -> AppResult<WalletBalances>;

    /// Record a score through the on-chain program, returning the signature
    async fn record_risk_score(&self, risk_score: u8, timestamp: i64) -> AppResult<String>;
}

/// Read access to recorded snapshots, for any wallet
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Snapshots owned by `owner`, oldest first
    async fn snapshots(&self, owner: &Pubkey) -> AppResult<Vec<RiskSnapshotRecord>>;
}

/// Outbound alert delivery
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, alert: &Alert) -> AppResult<()>;
}
