//! Sentra risk monitor library
//!
//! Watches a Solana wallet, prices its holdings against CoinGecko, scores
//! portfolio risk with parametric VaR and the Herfindahl-Hirschman index,
//! alerts over Telegram, and records scores through the Sentra on-chain
//! program.
//!
//! # Layout
//!
//! - [`core`]: errors, domain types and the ports the engine talks through
//! - [`services`]: Solana RPC and program client, CoinGecko, Telegram, risk math
//! - [`application`]: polling engine, shared status state, health, HTTP API
//! - [`config`]: layered configuration loading and validation
//! - [`infrastructure`]: metrics
//! - [`utils`]: telemetry setup, CLI, time helpers
//!
//! # Usage
//!
//! ```rust,no_run
//! use sentra_risk_monitor::{config::ConfigLoader, Application};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().load().await?;
//!     let app = Application::build(config)?;
//!     app.run(CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

// Core modules - Domain layer containing business entities and rules
pub mod core;

// Application layer - Engine, API and lifecycle
pub mod application;

// Configuration management - Multi-source configuration loading
pub mod config;

// Infrastructure layer - Metrics
pub mod infrastructure;

// Services layer - External integrations and risk statistics
pub mod services;

// Utilities - Shared helper functions and tools
pub mod utils;

// Re-export commonly used types for convenience
pub use application::Application;
pub use config::{AppConfig, ConfigLoader};
pub use core::{error::AppError, result::AppResult, types::*};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "sentra-risk-monitor");
    }
}
