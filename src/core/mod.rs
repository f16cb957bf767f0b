//! Core domain layer containing value objects, errors, ports, and domain rules
//!
//! This module defines the fundamental building blocks of the risk monitor.
//! It has no knowledge of RPC nodes, HTTP APIs, or Telegram; those are reached
//! through the traits in [`ports`].

pub mod error;
pub mod ports;
pub mod result;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
pub use types::*;

/// Domain constants and business rules
pub mod domain {
    /// Risk scoring rules
    pub mod risk {
        /// Highest score the engine publishes or the program accepts
        pub const MAX_RISK_SCORE: f64 = 100.0;

        /// Highest preference threshold the program accepts
        pub const MAX_THRESHOLD: u8 = 100;

        /// One-tailed 95% z-score used for parametric VaR
        pub const DEFAULT_CONFIDENCE_Z: f64 = 1.65;

        /// Minimum number of price points before a history is usable
        pub const MIN_HISTORY_POINTS: usize = 3;
    }

    /// Ledger units
    pub mod ledger {
        /// Lamports per SOL
        pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;
    }
}

/// Domain validation rules and helpers
pub mod validation {
    use super::domain::risk::MAX_THRESHOLD;
    use super::error::AppError;
    use super::result::{AppResult, ResultExt};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    /// Parse a base58 Solana address
    pub fn parse_pubkey(address: &str, field: &str) -> AppResult<Pubkey> {
        Pubkey::from_str(address.trim())
            .map_validation_err(field, || format!("Invalid Solana address '{}'", address))
    }

    /// Validate a preference threshold is within the program's accepted range
    pub fn validate_threshold(threshold: u8) -> AppResult<()> {
        crate::ensure!(
            threshold <= MAX_THRESHOLD,
            AppError::invalid_field(
                "threshold",
                format!("Threshold must be between 0 and {}, got {}", MAX_THRESHOLD, threshold),
            )
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_constants() {
        assert!(domain::risk::DEFAULT_CONFIDENCE_Z > 0.0);
        assert!(domain::risk::MIN_HISTORY_POINTS > 2);
        assert_eq!(domain::ledger::LAMPORTS_PER_SOL, 1e9);
    }

    #[test]
    fn test_validation_functions() {
        assert!(validation::parse_pubkey("11111111111111111111111111111111", "wallet").is_ok());
        assert!(validation::parse_pubkey("not-a-key", "wallet").is_err());

        assert!(validation::validate_threshold(0).is_ok());
        assert!(validation::validate_threshold(100).is_ok());
        assert!(validation::validate_threshold(150).is_err());
    }
}
