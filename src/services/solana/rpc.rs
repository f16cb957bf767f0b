//! Solana RPC client with retry logic
//!
//! Thin wrapper over the nonblocking Solana client. Every call goes through
//! [`RpcClient::execute_with_retry`], which applies exponential backoff bounded
//! by both an attempt count and a total elapsed time.

use backoff::{backoff::Backoff, ExponentialBackoff};
use solana_account_decoder::{UiAccountData, UiAccountEncoding};
use solana_client::{
    nonblocking::rpc_client::RpcClient as SolanaRpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::RpcFilterType,
    rpc_request::TokenAccountsFilter,
};
use solana_sdk::{
    account::Account,
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use super::types::TokenHolding;
use crate::config::models::SolanaConfig;
use crate::core::domain::ledger::LAMPORTS_PER_SOL;
use crate::core::error::AppError;
use crate::core::result::AppResult;

/// RPC client wrapper with retry logic
#[derive(Clone)]
pub struct RpcClient {
    /// Inner Solana RPC client
    client: Arc<SolanaRpcClient>,
    /// Commitment level
    commitment: CommitmentConfig,
    /// Maximum retries after the first attempt
    max_retries: u32,
    /// Initial backoff interval
    initial_backoff: Duration,
    /// Upper bound on time spent retrying
    max_elapsed: Duration,
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("url", &self.client.url())
            .field("commitment", &self.commitment.commitment)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Parse a configured commitment level, defaulting to `confirmed`
pub fn parse_commitment(value: &str) -> CommitmentLevel {
    match value {
        "processed" => CommitmentLevel::Processed,
        "finalized" => CommitmentLevel::Finalized,
        _ => CommitmentLevel::Confirmed,
    }
}

impl RpcClient {
    /// Create a new RPC client from configuration
    ///
    /// No request is made; an unreachable node surfaces on the first call.
    pub fn new(config: &SolanaConfig) -> Self {
        info!("🔗 Creating RPC client for: {}", config.rpc_url);

        let commitment = CommitmentConfig {
            commitment: parse_commitment(&config.commitment),
        };
        let client = SolanaRpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            Duration::from_millis(config.request_timeout_ms),
            commitment,
        );

        Self {
            client: Arc::new(client),
            commitment,
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.retry_backoff_ms),
            max_elapsed: Duration::from_millis(config.retry_max_elapsed_ms),
        }
    }

    /// Endpoint URL
    pub fn url(&self) -> String {
        self.client.url()
    }

    /// Retry schedule starting at the configured initial interval
    fn backoff_policy(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_elapsed_time: Some(self.max_elapsed),
            ..ExponentialBackoff::default()
        };
        // current_interval still holds the crate default until reset
        backoff.reset();
        backoff
    }

    /// Execute RPC request with retry logic
    async fn execute_with_retry<T, F, Fut>(&self, operation: &str, f: F) -> AppResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, solana_client::client_error::ClientError>>,
    {
        let mut backoff = self.backoff_policy();
        let start_time = Instant::now();
        let mut attempt = 0u32;

        loop {
            match f().await {
                Ok(result) => {
                    debug!("✅ RPC {} succeeded in {:?}", operation, start_time.elapsed());
                    return Ok(result);
                }
                Err(e) => {
                    warn!("⚠️  RPC {} failed (attempt {}): {}", operation, attempt + 1, e);

                    let next = if attempt < self.max_retries {
                        backoff.next_backoff()
                    } else {
                        None
                    };

                    match next {
                        Some(duration) => {
                            debug!("🔄 Retrying {} after {:?}", operation, duration);
                            attempt += 1;
                            tokio::time::sleep(duration).await;
                        }
                        None => {
                            error!("❌ RPC {} failed after {} attempts", operation, attempt + 1);
                            return Err(AppError::solana(format!("RPC {} failed: {}", operation, e)));
                        }
                    }
                }
            }
        }
    }

    /// Get SOL balance
    #[instrument(skip(self))]
    pub async fn get_sol_balance(&self, owner: &Pubkey) -> AppResult<f64> {
        let lamports = self
            .execute_with_retry("get_balance", || self.client.get_balance(owner))
            .await?;

        Ok(lamports as f64 / LAMPORTS_PER_SOL)
    }

    /// All SPL token accounts owned by the wallet
    #[instrument(skip(self))]
    pub async fn get_token_holdings(&self, owner: &Pubkey) -> AppResult<Vec<TokenHolding>> {
        let program_id = spl_token::id();
        let accounts = self
            .execute_with_retry("get_token_accounts_by_owner", || {
                self.client
                    .get_token_accounts_by_owner(owner, TokenAccountsFilter::ProgramId(program_id))
            })
            .await?;

        let holdings = accounts
            .iter()
            .filter_map(|keyed| match &keyed.account.data {
                UiAccountData::Json(parsed) => {
                    TokenHolding::from_parsed(&keyed.pubkey, &parsed.parsed)
                }
                _ => {
                    debug!("Skipping non-parsed token account {}", keyed.pubkey);
                    None
                }
            })
            .collect::<Vec<_>>();

        debug!("📦 Found {} token holdings", holdings.len());
        Ok(holdings)
    }

    /// Program-owned accounts matching the given filters, base64 encoded
    #[instrument(skip(self, filters))]
    pub async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: Vec<RpcFilterType>,
    ) -> AppResult<Vec<(Pubkey, Account)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(filters),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.commitment),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };

        self.execute_with_retry("get_program_accounts", || {
            self.client
                .get_program_accounts_with_config(program_id, config.clone())
        })
        .await
    }

    /// Fetch an account, `None` when it does not exist
    #[instrument(skip(self))]
    pub async fn get_account(&self, address: &Pubkey) -> AppResult<Option<Account>> {
        let response = self
            .execute_with_retry("get_account", || {
                self.client
                    .get_account_with_commitment(address, self.commitment)
            })
            .await?;

        Ok(response.value)
    }

    /// Latest blockhash for signing
    pub async fn get_latest_blockhash(&self) -> AppResult<solana_sdk::hash::Hash> {
        self.execute_with_retry("get_latest_blockhash", || {
            self.client.get_latest_blockhash()
        })
        .await
    }

    /// Submit a signed transaction and wait for confirmation
    #[instrument(skip(self, transaction))]
    pub async fn send_and_confirm(&self, transaction: &Transaction) -> AppResult<Signature> {
        self.execute_with_retry("send_and_confirm_transaction", || {
            self.client.send_and_confirm_transaction(transaction)
        })
        .await
        .map_err(|e| match e {
            AppError::Solana { message, .. } => AppError::Solana {
                message,
                transaction_signature: transaction.signatures.first().map(|s| s.to_string()),
            },
            other => other,
        })
    }

    /// Node health check
    pub async fn health_check(&self) -> AppResult<()> {
        self.execute_with_retry("get_health", || self.client.get_health())
            .await
    }
}
