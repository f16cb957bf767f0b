//! Configuration data structures and models
//!
//! This module defines the complete configuration structure for the risk
//! monitor. Every section has defaults so an empty file (or no file at all)
//! yields a runnable local-validator setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::core::domain::risk::DEFAULT_CONFIDENCE_Z;
use crate::core::types::{ScoreMethod, TrackedAsset};

/// Main application configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: EnvironmentConfig,

    /// Solana RPC, wallet and program configuration
    pub solana: SolanaConfig,

    /// Price API configuration
    pub pricing: PricingConfig,

    /// Assets included in the portfolio
    pub assets: Vec<TrackedAsset>,

    /// Polling engine and alert thresholds
    pub engine: EngineConfig,

    /// Telegram alert delivery
    pub telegram: TelegramConfig,

    /// HTTP status API
    pub server: ServerConfig,

    /// Metrics and log output
    pub monitoring: MonitoringConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: EnvironmentConfig::default(),
            solana: SolanaConfig::default(),
            pricing: PricingConfig::default(),
            assets: default_assets(),
            engine: EngineConfig::default(),
            telegram: TelegramConfig::default(),
            server: ServerConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

/// Environment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Environment name (development, staging, production)
    pub name: String,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log format (json, pretty, compact)
    pub log_format: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            name: "development".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

/// Solana blockchain configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolanaConfig {
    /// RPC endpoint URL
    pub rpc_url: String,

    /// Commitment level (processed, confirmed, finalized)
    pub commitment: String,

    /// Solana CLI keypair file of the monitored wallet
    pub keypair_path: String,

    /// Risk program id
    pub program_id: String,

    /// Maximum retry attempts per RPC call
    pub max_retries: u32,

    /// Initial retry backoff in milliseconds
    pub retry_backoff_ms: u64,

    /// Upper bound on total time spent retrying one call
    pub retry_max_elapsed_ms: u64,

    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for SolanaConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8899".to_string(),
            commitment: "confirmed".to_string(),
            keypair_path: "~/.config/solana/id.json".to_string(),
            program_id: "3hvd91mHEs4ujsWkRAaGLzkvY7VTNwpaD79is2YFZrma".to_string(),
            max_retries: 3,
            retry_backoff_ms: 500,
            retry_max_elapsed_ms: 15_000,
            request_timeout_ms: 10_000,
        }
    }
}

impl SolanaConfig {
    /// Keypair path with a leading `~` expanded against `$HOME`
    pub fn resolved_keypair_path(&self) -> PathBuf {
        match self.keypair_path.strip_prefix("~/") {
            Some(rest) => std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.keypair_path)),
            None => PathBuf::from(&self.keypair_path),
        }
    }
}

/// Price API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// CoinGecko API base URL
    pub base_url: String,

    /// Optional demo API key
    pub api_key: Option<String>,

    /// Quote currency
    pub vs_currency: String,

    /// Days of history used for covariance
    pub history_days: u32,

    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            api_key: None,
            vs_currency: "usd".to_string(),
            history_days: 30,
            request_timeout_ms: 10_000,
        }
    }
}

/// Polling engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds between assessments
    pub monitor_interval_secs: u64,

    /// Seconds before cached price history is refetched
    pub history_refresh_interval_secs: u64,

    /// Upper bound on one assessment in seconds
    pub tick_timeout_secs: u64,

    /// Asset whose price drop triggers shock alerts
    pub shock_asset: String,

    /// Drop, in percent between two ticks, that counts as a shock
    pub shock_threshold_percent: f64,

    /// Score at or above which a high-risk alert is sent
    pub risk_alert_threshold: f64,

    /// Minimum seconds between two alerts of any kind
    pub alert_cooldown_secs: u64,

    /// z-score for parametric VaR
    pub confidence_z: f64,

    /// Metric published as the risk score
    pub score_method: ScoreMethod,

    /// Submit each score to the on-chain program
    pub record_on_chain: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            monitor_interval_secs: 60,
            history_refresh_interval_secs: 60 * 60,
            tick_timeout_secs: 45,
            shock_asset: "SOL".to_string(),
            shock_threshold_percent: 5.0,
            risk_alert_threshold: 25.0,
            alert_cooldown_secs: 5 * 60,
            confidence_z: DEFAULT_CONFIDENCE_Z,
            score_method: ScoreMethod::Var,
            record_on_chain: true,
        }
    }
}

impl EngineConfig {
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }

    pub fn history_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.history_refresh_interval_secs)
    }

    pub fn tick_timeout(&self) -> Duration {
        Duration::from_secs(self.tick_timeout_secs)
    }

    pub fn alert_cooldown(&self) -> Duration {
        Duration::from_secs(self.alert_cooldown_secs)
    }
}

/// Telegram bot configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token; alerts are disabled when empty
    pub bot_token: String,

    /// Numeric chat id or `@channel` name; alerts are disabled when empty
    pub chat_id: String,

    /// Bot API base URL override
    pub api_url: Option<String>,
}

impl TelegramConfig {
    /// Whether both credentials are present
    pub fn is_enabled(&self) -> bool {
        !self.bot_token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

/// HTTP status API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Allow cross-origin requests from any origin
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            enable_cors: true,
        }
    }
}

impl ServerConfig {
    /// `host:port` bind string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Monitoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Expose Prometheus metrics
    pub enable_metrics: bool,

    /// Prometheus listener port
    pub metrics_port: u16,

    /// Directory for daily rolling log files; stdout only when unset
    pub log_directory: Option<String>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: false,
            metrics_port: 9090,
            log_directory: None,
        }
    }
}

/// Assets tracked out of the box
pub fn default_assets() -> Vec<TrackedAsset> {
    vec![
        TrackedAsset::native("SOL", "solana"),
        TrackedAsset::token("BONK", "bonk", "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263"),
        TrackedAsset::token(
            "JUP",
            "jupiter-exchange-solana",
            "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN",
        ),
        TrackedAsset::token("USDC", "usd-coin", "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v")
            .with_fallback_price(1.0),
    ]
}

impl AppConfig {
    /// Validate configuration, returning an error listing every problem
    pub fn validate(&self) -> crate::core::result::AppResult<super::validation::ValidationResult> {
        super::validation::ConfigValidator::new().validate(self)
    }

    /// Whether the config passes validation
    pub fn is_valid(&self) -> bool {
        self.validate().map(|r| r.is_valid).unwrap_or(false)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment.name == "production"
    }

    /// Look up a tracked asset by symbol
    pub fn asset(&self, symbol: &str) -> Option<&TrackedAsset> {
        self.assets.iter().find(|a| a.symbol == symbol)
    }
}
