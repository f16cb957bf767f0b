//! Configuration validation logic
//!
//! Validates every configuration section before the application starts.
//! Errors make the configuration unusable; warnings describe features that
//! will be silently disabled (no Telegram credentials, no signer keypair).

use std::collections::HashSet;
use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};
use url::Url;

use super::models::{
    AppConfig, EngineConfig, EnvironmentConfig, MonitoringConfig, PricingConfig, ServerConfig,
    SolanaConfig, TelegramConfig,
};
use crate::core::result::AppResult;
use crate::core::types::TrackedAsset;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["json", "pretty", "compact"];
const COMMITMENTS: &[&str] = &["processed", "confirmed", "finalized"];

/// Configuration validator
#[derive(Debug, Default)]
pub struct ConfigValidator {
    /// Treat warnings as errors
    strict_mode: bool,
}

/// Validation result with warnings and errors
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Fatal validation errors
    pub errors: Vec<String>,

    /// Non-fatal warnings
    pub warnings: Vec<String>,

    /// Validation passed
    pub is_valid: bool,
}

impl ValidationResult {
    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

impl ConfigValidator {
    /// Create a new validator with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable strict validation mode
    pub fn with_strict_mode(mut self) -> Self {
        self.strict_mode = true;
        self
    }

    /// Validate the complete application configuration
    pub fn validate(&self, config: &AppConfig) -> AppResult<ValidationResult> {
        debug!("🔍 Starting configuration validation");

        let mut result = ValidationResult::default();

        self.validate_environment(&config.environment, &mut result);
        self.validate_solana(&config.solana, &mut result);
        self.validate_pricing(&config.pricing, &mut result);
        self.validate_assets(&config.assets, &mut result);
        self.validate_engine(&config.engine, &mut result);
        self.validate_telegram(&config.telegram, &mut result);
        self.validate_server(&config.server, &mut result);
        self.validate_monitoring(&config.monitoring, &config.server, &mut result);

        // Cross-section checks
        if config.asset(&config.engine.shock_asset).is_none() {
            result.error(format!(
                "engine.shock_asset '{}' is not a tracked asset",
                config.engine.shock_asset
            ));
        }

        result.is_valid =
            result.errors.is_empty() && (!self.strict_mode || result.warnings.is_empty());

        if result.is_valid {
            debug!("✅ Configuration validation passed");
        } else {
            warn!("❌ Configuration validation failed");
            for error in &result.errors {
                warn!("   Error: {}", error);
            }
        }
        for warning in &result.warnings {
            warn!("   Warning: {}", warning);
        }

        Ok(result)
    }

    fn validate_environment(&self, config: &EnvironmentConfig, result: &mut ValidationResult) {
        if config.name.trim().is_empty() {
            result.error("environment.name must not be empty");
        }
        if !LOG_LEVELS.contains(&config.log_level.to_ascii_lowercase().as_str()) {
            result.error(format!(
                "Invalid log level '{}'. Must be one of {:?}",
                config.log_level, LOG_LEVELS
            ));
        }
        if !LOG_FORMATS.contains(&config.log_format.as_str()) {
            result.error(format!(
                "Invalid log format '{}'. Must be 'json', 'pretty', or 'compact'",
                config.log_format
            ));
        }
    }

    fn validate_solana(&self, config: &SolanaConfig, result: &mut ValidationResult) {
        if let Err(e) = Url::parse(&config.rpc_url) {
            result.error(format!("solana.rpc_url '{}' is not a valid URL: {}", config.rpc_url, e));
        }
        if !COMMITMENTS.contains(&config.commitment.as_str()) {
            result.error(format!(
                "solana.commitment '{}' must be one of {:?}",
                config.commitment, COMMITMENTS
            ));
        }
        if Pubkey::from_str(&config.program_id).is_err() {
            result.error(format!("solana.program_id '{}' is not a valid address", config.program_id));
        }
        if config.request_timeout_ms == 0 {
            result.error("solana.request_timeout_ms must be greater than zero");
        }
        if !config.resolved_keypair_path().exists() {
            result.warning(format!(
                "Keypair file {} not found; wallet reads and on-chain recording will fail",
                config.resolved_keypair_path().display()
            ));
        }
    }

    fn validate_pricing(&self, config: &PricingConfig, result: &mut ValidationResult) {
        if let Err(e) = Url::parse(&config.base_url) {
            result.error(format!("pricing.base_url '{}' is not a valid URL: {}", config.base_url, e));
        }
        if config.vs_currency.trim().is_empty() {
            result.error("pricing.vs_currency must not be empty");
        }
        if config.history_days < 2 {
            result.error("pricing.history_days must be at least 2");
        }
    }

    fn validate_assets(&self, assets: &[TrackedAsset], result: &mut ValidationResult) {
        if assets.is_empty() {
            result.error("At least one asset must be tracked");
            return;
        }

        let mut symbols = HashSet::new();
        let mut natives = 0;
        for asset in assets {
            if asset.symbol.trim().is_empty() {
                result.error("Asset symbol must not be empty");
            } else if !symbols.insert(asset.symbol.as_str()) {
                result.error(format!("Duplicate asset symbol '{}'", asset.symbol));
            }
            if asset.coingecko_id.trim().is_empty() {
                result.error(format!("Asset '{}' has no coingecko_id", asset.symbol));
            }
            match &asset.mint {
                Some(mint) if Pubkey::from_str(mint).is_err() => {
                    result.error(format!("Asset '{}' has invalid mint '{}'", asset.symbol, mint));
                }
                Some(_) => {}
                None => natives += 1,
            }
            if matches!(asset.fallback_price, Some(p) if p < 0.0) {
                result.error(format!("Asset '{}' has a negative fallback price", asset.symbol));
            }
        }

        if natives > 1 {
            result.warning("More than one asset is bound to the native SOL balance");
        }
    }

    fn validate_engine(&self, config: &EngineConfig, result: &mut ValidationResult) {
        if config.monitor_interval_secs == 0 {
            result.error("engine.monitor_interval_secs must be greater than zero");
        }
        if config.tick_timeout_secs == 0 {
            result.error("engine.tick_timeout_secs must be greater than zero");
        }
        if config.shock_threshold_percent <= 0.0 {
            result.error("engine.shock_threshold_percent must be positive");
        }
        if !(0.0..=100.0).contains(&config.risk_alert_threshold) {
            result.error(format!(
                "engine.risk_alert_threshold {} must be between 0 and 100",
                config.risk_alert_threshold
            ));
        }
        if config.confidence_z <= 0.0 {
            result.error("engine.confidence_z must be positive");
        }
    }

    fn validate_telegram(&self, config: &TelegramConfig, result: &mut ValidationResult) {
        if !config.is_enabled() {
            result.warning("Telegram bot token or chat id not set; alerts are disabled");
            return;
        }
        if let Some(api_url) = &config.api_url {
            if let Err(e) = Url::parse(api_url) {
                result.error(format!("telegram.api_url '{}' is not a valid URL: {}", api_url, e));
            }
        }
    }

    fn validate_server(&self, config: &ServerConfig, result: &mut ValidationResult) {
        if config.port == 0 {
            result.error("server.port must not be zero");
        }
        if config.host.trim().is_empty() {
            result.error("server.host must not be empty");
        }
    }

    fn validate_monitoring(
        &self,
        config: &MonitoringConfig,
        server: &ServerConfig,
        result: &mut ValidationResult,
    ) {
        if config.enable_metrics && config.metrics_port == server.port {
            result.error(format!(
                "monitoring.metrics_port {} collides with server.port",
                config.metrics_port
            ));
        }
    }
}
