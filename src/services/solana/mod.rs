//! Solana blockchain service module
//!
//! This module provides Solana RPC connectivity, wallet balance reads, and the
//! client side of the on-chain risk program.

pub mod program;
pub mod rpc;
pub mod types;

// Re-export commonly used types
pub use rpc::RpcClient;
pub use types::TokenHolding;

use async_trait::async_trait;
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
    transaction::Transaction,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::application::health::ComponentHealth;
use crate::config::AppConfig;
use crate::core::error::AppError;
use crate::core::ports::{Ledger, SnapshotStore};
use crate::core::result::AppResult;
use crate::core::types::{RiskPreferenceRecord, RiskSnapshotRecord, WalletBalances};
use crate::core::validation::parse_pubkey;

/// Solana blockchain service coordinator
pub struct SolanaService {
    /// RPC client
    rpc: RpcClient,
    /// Signer of the monitored wallet, if the keypair file could be read
    signer: Option<Arc<Keypair>>,
    /// Risk program id
    program_id: Pubkey,
}

impl std::fmt::Debug for SolanaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaService")
            .field("rpc", &self.rpc)
            .field("wallet", &self.wallet())
            .field("program_id", &self.program_id)
            .finish()
    }
}

impl SolanaService {
    /// Create a new Solana service
    ///
    /// A missing or unreadable keypair is not fatal: read-only endpoints keep
    /// working, and wallet reads fail with a configuration error.
    #[instrument(skip(config))]
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        info!("⛓️  Initializing Solana blockchain service");

        let program_id = parse_pubkey(&config.solana.program_id, "solana.program_id")?;
        let keypair_path = config.solana.resolved_keypair_path();

        let signer = match read_keypair_file(&keypair_path) {
            Ok(keypair) => {
                info!("🔑 Loaded wallet {}", keypair.pubkey());
                Some(Arc::new(keypair))
            }
            Err(e) => {
                warn!(
                    "⚠️  Could not read keypair {}: {}",
                    keypair_path.display(),
                    e
                );
                None
            }
        };

        Ok(Self::from_parts(RpcClient::new(&config.solana), signer, program_id))
    }

    /// Assemble a service from already-built parts
    pub fn from_parts(rpc: RpcClient, signer: Option<Arc<Keypair>>, program_id: Pubkey) -> Self {
        Self {
            rpc,
            signer,
            program_id,
        }
    }

    /// Monitored wallet address
    pub fn wallet(&self) -> Option<Pubkey> {
        self.signer.as_ref().map(|k| k.pubkey())
    }

    /// Risk program id
    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    fn signer(&self) -> AppResult<&Keypair> {
        self.signer
            .as_deref()
            .ok_or_else(|| AppError::config("No wallet keypair loaded"))
    }

    /// Sign and submit a single instruction from the wallet
    async fn submit(&self, instruction: Instruction) -> AppResult<String> {
        let signer = self.signer()?;
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&signer.pubkey()),
            &[signer],
            blockhash,
        );

        let signature = self.rpc.send_and_confirm(&transaction).await?;
        Ok(signature.to_string())
    }

    /// Create the wallet's preference account
    #[instrument(skip(self))]
    pub async fn initialize_preferences(&self, threshold: u8) -> AppResult<String> {
        let user = self.signer()?.pubkey();
        let ix = program::initialize_preferences_ix(&self.program_id, &user, threshold)?;
        let signature = self.submit(ix).await?;
        info!("✅ Preferences initialized (threshold {}): {}", threshold, signature);
        Ok(signature)
    }

    /// Change the wallet's alert threshold
    #[instrument(skip(self))]
    pub async fn update_threshold(&self, new_threshold: u8) -> AppResult<String> {
        let user = self.signer()?.pubkey();
        let ix = program::update_threshold_ix(&self.program_id, &user, new_threshold)?;
        let signature = self.submit(ix).await?;
        info!("✅ Threshold updated to {}: {}", new_threshold, signature);
        Ok(signature)
    }

    /// Decode the preference account of `owner`, if it exists
    #[instrument(skip(self))]
    pub async fn fetch_preference(&self, owner: &Pubkey) -> AppResult<Option<RiskPreferenceRecord>> {
        let address = program::preference_address(&self.program_id, owner);
        match self.rpc.get_account(&address).await? {
            Some(account) => program::decode_preference(&account.data).map(Some),
            None => Ok(None),
        }
    }

    /// Probe the RPC node
    pub async fn check_health(&self) -> ComponentHealth {
        let mut component = ComponentHealth::new("solana_rpc", true);
        let start_time = std::time::Instant::now();

        match self.rpc.health_check().await {
            Ok(()) => component.mark_healthy(
                Some(format!("RPC healthy: {}", self.rpc.url())),
                Some(start_time.elapsed().as_millis() as u64),
            ),
            Err(e) => component.mark_unhealthy(format!("RPC health check failed: {}", e)),
        }

        component
    }
}

#[async_trait]
impl Ledger for SolanaService {
    #[instrument(skip(self))]
    async fn wallet_balances(&self) -> AppResult<WalletBalances> {
        let owner = self.signer()?.pubkey();

        let (sol, holdings) = tokio::try_join!(
            self.rpc.get_sol_balance(&owner),
            self.rpc.get_token_holdings(&owner)
        )?;

        debug!("💰 Wallet {}: {} SOL, {} token accounts", owner, sol, holdings.len());
        Ok(types::aggregate_balances(sol, &holdings))
    }

    #[instrument(skip(self))]
    async fn record_risk_score(&self, risk_score: u8, timestamp: i64) -> AppResult<String> {
        let user = self.signer()?.pubkey();
        let ix = program::record_risk_score_ix(&self.program_id, &user, risk_score, timestamp);
        let signature = self.submit(ix).await?;
        info!("⛓️  Risk score {} recorded: {}", risk_score, signature);
        Ok(signature)
    }
}

#[async_trait]
impl SnapshotStore for SolanaService {
    #[instrument(skip(self))]
    async fn snapshots(&self, owner: &Pubkey) -> AppResult<Vec<RiskSnapshotRecord>> {
        let accounts = self
            .rpc
            .get_program_accounts(&self.program_id, program::snapshot_filters(owner))
            .await?;

        let mut records = accounts
            .iter()
            .filter_map(|(address, account)| {
                match program::decode_snapshot(address, &account.data) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!("⚠️  Skipping undecodable snapshot {}: {}", address, e);
                        None
                    }
                }
            })
            .collect::<Vec<_>>();

        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::SolanaConfig;
    use assert_matches::assert_matches;

    fn offline_service(signer: Option<Arc<Keypair>>) -> SolanaService {
        let config = SolanaConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            max_retries: 0,
            request_timeout_ms: 100,
            ..SolanaConfig::default()
        };
        SolanaService::from_parts(RpcClient::new(&config), signer, Pubkey::new_unique())
    }

    #[tokio::test]
    async fn test_wallet_reads_require_keypair() {
        let service = offline_service(None);
        assert!(service.wallet().is_none());
        assert_matches!(service.wallet_balances().await, Err(AppError::Config { .. }));
        assert_matches!(service.record_risk_score(10, 1).await, Err(AppError::Config { .. }));
    }

    #[test]
    fn test_missing_keypair_is_not_fatal() {
        let mut config = AppConfig::default();
        config.solana.keypair_path = "/nonexistent/id.json".to_string();
        let service = SolanaService::new(&config).unwrap();
        assert!(service.wallet().is_none());
    }

    #[test]
    fn test_invalid_program_id_is_rejected() {
        let mut config = AppConfig::default();
        config.solana.program_id = "nope".to_string();
        assert_matches!(SolanaService::new(&config), Err(AppError::Validation { .. }));
    }

    #[test]
    fn test_wallet_from_signer() {
        let keypair = Arc::new(Keypair::new());
        let service = offline_service(Some(keypair.clone()));
        assert_eq!(service.wallet(), Some(keypair.pubkey()));
    }
}
