//! Configuration loader with multi-source support
//!
//! Sources are layered, later ones winning:
//!
//! 1. built-in defaults
//! 2. the base file (TOML or YAML)
//! 3. overlay files, in the order given
//! 4. `SENTRA__SECTION__KEY` environment variables
//! 5. legacy plain environment variables (`RPC_URL`, `TELEGRAM_BOT_TOKEN`, ...)
//! 6. command-line arguments

use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::models::AppConfig;
use crate::core::error::AppError;
use crate::core::result::{AppResult, ResultExt};
use crate::utils::CliArgs;

/// Prefix of `SENTRA__SECTION__KEY` environment overrides
const ENV_PREFIX: &str = "SENTRA";

/// Default locations searched for the base configuration file
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "configs/config.toml",
    "config.toml",
    "configs/config.yaml",
    "/etc/sentra/config.toml",
];

/// Configuration loader with support for multiple sources
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Base configuration path
    config_path: Option<PathBuf>,

    /// CLI arguments
    cli_args: Option<CliArgs>,

    /// Enable environment variable loading
    enable_env: bool,

    /// Additional configuration files
    additional_files: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            config_path: None,
            cli_args: None,
            enable_env: true,
            additional_files: Vec::new(),
        }
    }

    /// Set the base configuration path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set CLI arguments
    pub fn with_cli_args(mut self, args: CliArgs) -> Self {
        self.additional_files
            .extend(args.overlays.iter().map(PathBuf::from));
        self.cli_args = Some(args);
        self
    }

    /// Disable environment variable loading
    pub fn without_env(mut self) -> Self {
        self.enable_env = false;
        self
    }

    /// Add an additional configuration file
    pub fn with_additional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.additional_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Built-in defaults, without reading any source
    pub fn create_default_config(&self) -> AppConfig {
        AppConfig::default()
    }

    /// Load and build the complete application configuration
    pub async fn load(self) -> AppResult<AppConfig> {
        info!("🔧 Starting configuration loading process");

        let defaults = Config::try_from(&AppConfig::default())
            .map_config_err(|| "Failed to serialize default configuration".to_string())?;
        let mut builder = Config::builder().add_source(defaults);

        match self.resolve_config_path() {
            Some(path) if path.exists() => {
                info!("📄 Loading base configuration from: {}", path.display());
                builder = builder.add_source(File::from(path));
            }
            Some(path) => {
                warn!("⚠️  Configuration file not found: {}", path.display());
                warn!("⚠️  Using default configuration values");
            }
            None => {
                debug!("No configuration file found, using defaults");
            }
        }

        for file_path in &self.additional_files {
            if !file_path.exists() {
                return Err(AppError::config(format!(
                    "Overlay configuration file not found: {}",
                    file_path.display()
                )));
            }
            info!("📄 Applying overlay configuration: {}", file_path.display());
            builder = builder.add_source(File::from(file_path.as_path()));
        }

        if self.enable_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .ignore_empty(true),
            );
        }

        let mut config: AppConfig = builder
            .build()
            .map_config_err(|| "Failed to merge configuration sources".to_string())?
            .try_deserialize()
            .map_config_err(|| "Failed to deserialize configuration".to_string())?;

        if self.enable_env {
            apply_legacy_env(&mut config);
        }

        if let Some(ref cli_args) = self.cli_args {
            apply_cli_overrides(&mut config, cli_args);
        }

        info!("✅ Configuration loading completed successfully");
        debug!(
            "📊 Final configuration: environment={}, rpc={}",
            config.environment.name, config.solana.rpc_url
        );

        Ok(config)
    }

    /// Resolve the configuration file path
    fn resolve_config_path(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.config_path {
            return Some(path.clone());
        }

        if let Some(path) = self.cli_args.as_ref().and_then(|a| a.config_path.as_ref()) {
            return Some(PathBuf::from(path));
        }

        if self.enable_env {
            if let Ok(path) = env::var("CONFIG_PATH") {
                return Some(PathBuf::from(path));
            }
        }

        DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|pb| pb.exists())
    }
}

/// Plain variable names kept for `.env` files written for the original service
fn apply_legacy_env(config: &mut AppConfig) {
    let overrides: [(&str, fn(&mut AppConfig, String)); 4] = [
        ("RPC_URL", |cfg, val| cfg.solana.rpc_url = val),
        ("TELEGRAM_BOT_TOKEN", |cfg, val| cfg.telegram.bot_token = val),
        ("TELEGRAM_CHAT_ID", |cfg, val| cfg.telegram.chat_id = val),
        ("SOLANA_KEYPAIR_PATH", |cfg, val| cfg.solana.keypair_path = val),
    ];

    for (key, apply) in overrides {
        if let Ok(value) = env::var(key) {
            if !value.trim().is_empty() {
                apply(config, value);
                debug!("🔄 Applied environment override: {}", key);
            }
        }
    }
}

/// Apply CLI argument overrides
fn apply_cli_overrides(config: &mut AppConfig, cli_args: &CliArgs) {
    debug!("⌨️  Applying CLI argument overrides");

    if let Some(ref env_name) = cli_args.environment {
        config.environment.name = env_name.clone();
    }
    if let Some(ref level) = cli_args.log_level {
        config.environment.log_level = level.clone();
    }
    if let Some(ref format) = cli_args.log_format {
        config.environment.log_format = format.clone();
    }
    if let Some(ref rpc_url) = cli_args.rpc_url {
        config.solana.rpc_url = rpc_url.clone();
    }
    if let Some(port) = cli_args.port {
        config.server.port = port;
    }
}

/// Load configuration with default settings
pub async fn load_config() -> AppResult<AppConfig> {
    ConfigLoader::new().load().await
}

/// Load configuration with CLI arguments
pub async fn load_config_with_args(cli_args: CliArgs) -> AppResult<AppConfig> {
    ConfigLoader::new().with_cli_args(cli_args).load().await
}
