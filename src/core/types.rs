//! Common domain types used across the risk monitor
//!
//! These are plain value objects: balances read from the ledger, the priced
//! portfolio built from them, the risk assessment computed each polling tick,
//! and the records the on-chain program stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// An asset the monitor prices and includes in the portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedAsset {
    /// Display symbol, e.g. `SOL`
    pub symbol: String,

    /// CoinGecko coin id, e.g. `solana`
    pub coingecko_id: String,

    /// SPL mint address; `None` means the wallet's native SOL balance
    #[serde(default)]
    pub mint: Option<String>,

    /// Price used when the price API omits this asset
    #[serde(default)]
    pub fallback_price: Option<f64>,
}

impl TrackedAsset {
    /// Asset backed by the native SOL balance
    pub fn native<S: Into<String>, I: Into<String>>(symbol: S, coingecko_id: I) -> Self {
        Self {
            symbol: symbol.into(),
            coingecko_id: coingecko_id.into(),
            mint: None,
            fallback_price: None,
        }
    }

    /// Asset backed by an SPL token mint
    pub fn token<S: Into<String>, I: Into<String>, M: Into<String>>(
        symbol: S,
        coingecko_id: I,
        mint: M,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            coingecko_id: coingecko_id.into(),
            mint: Some(mint.into()),
            fallback_price: None,
        }
    }

    /// Set the price used when the API has no quote
    pub fn with_fallback_price(mut self, price: f64) -> Self {
        self.fallback_price = Some(price);
        self
    }

    /// Whether the asset is the native SOL balance
    pub fn is_native(&self) -> bool {
        self.mint.is_none()
    }
}

/// Balances of the monitored wallet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletBalances {
    /// Native balance in SOL
    pub sol: f64,
    /// UI token amounts keyed by mint address
    pub tokens: HashMap<String, f64>,
}

impl WalletBalances {
    /// Amount held for a tracked asset
    pub fn amount_for(&self, asset: &TrackedAsset) -> f64 {
        match &asset.mint {
            None => self.sol,
            Some(mint) => self.tokens.get(mint).copied().unwrap_or(0.0),
        }
    }
}

/// A single priced position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub symbol: String,
    pub amount: f64,
    pub price: f64,
    pub value: f64,
}

/// The priced portfolio at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioValuation {
    pub positions: Vec<Position>,
    pub total_value: f64,
}

impl PortfolioValuation {
    /// Price every tracked asset against the wallet balances
    pub fn build(
        assets: &[TrackedAsset],
        balances: &WalletBalances,
        prices: &HashMap<String, f64>,
    ) -> Self {
        let positions: Vec<Position> = assets
            .iter()
            .map(|asset| {
                let amount = balances.amount_for(asset);
                let price = prices.get(&asset.symbol).copied().unwrap_or(0.0);
                Position {
                    symbol: asset.symbol.clone(),
                    amount,
                    price,
                    value: amount * price,
                }
            })
            .collect();

        let total_value = positions.iter().map(|p| p.value).sum();

        Self {
            positions,
            total_value,
        }
    }

    /// Position weights relative to total value, in position order
    pub fn weights(&self) -> Vec<f64> {
        let values: Vec<f64> = self.positions.iter().map(|p| p.value).collect();
        crate::services::risk::portfolio_weights(&values)
    }
}

/// Which metric drives the published risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMethod {
    /// Parametric Value-at-Risk as a percentage of portfolio value
    #[default]
    Var,
    /// Herfindahl-Hirschman concentration index scaled to 0-100
    Hhi,
}

impl fmt::Display for ScoreMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var => write!(f, "var"),
            Self::Hhi => write!(f, "hhi"),
        }
    }
}

impl FromStr for ScoreMethod {
    type Err = crate::core::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "var" => Ok(Self::Var),
            "hhi" => Ok(Self::Hhi),
            other => Err(crate::core::error::AppError::invalid_field(
                "score_method",
                format!("Unknown score method '{}'", other),
            )),
        }
    }
}

/// Result of one risk assessment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub portfolio: PortfolioValuation,
    pub variance: f64,
    pub sigma: f64,
    pub value_at_risk: f64,
    pub var_score: f64,
    pub hhi: f64,
    pub hhi_score: f64,
    pub method: ScoreMethod,
    /// Published score in `[0, 100]`
    pub risk_score: f64,
    pub assessed_at: DateTime<Utc>,
}

impl RiskAssessment {
    /// Score as submitted to the on-chain program
    pub fn on_chain_score(&self) -> u8 {
        self.risk_score.clamp(0.0, 100.0).floor() as u8
    }
}

/// A risk snapshot recorded by the on-chain program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSnapshotRecord {
    /// Snapshot account address
    pub public_key: String,
    pub risk_score: u8,
    /// Unix seconds
    pub timestamp: i64,
}

/// The wallet's on-chain risk preference account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskPreferenceRecord {
    pub owner: String,
    pub threshold: u8,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets() -> Vec<TrackedAsset> {
        vec![
            TrackedAsset::native("SOL", "solana"),
            TrackedAsset::token("USDC", "usd-coin", "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v")
                .with_fallback_price(1.0),
        ]
    }

    #[test]
    fn test_valuation_uses_native_and_token_balances() {
        let mut balances = WalletBalances {
            sol: 2.0,
            ..WalletBalances::default()
        };
        balances
            .tokens
            .insert("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(), 100.0);

        let prices = HashMap::from([("SOL".to_string(), 150.0), ("USDC".to_string(), 1.0)]);
        let valuation = PortfolioValuation::build(&assets(), &balances, &prices);

        assert_eq!(valuation.total_value, 400.0);
        assert_eq!(valuation.weights(), vec![0.75, 0.25]);
    }

    #[test]
    fn test_missing_price_values_position_at_zero() {
        let balances = WalletBalances {
            sol: 1.0,
            ..WalletBalances::default()
        };
        let valuation = PortfolioValuation::build(&assets(), &balances, &HashMap::new());
        assert_eq!(valuation.total_value, 0.0);
        assert_eq!(valuation.weights(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_score_method_parsing() {
        assert_eq!("VaR".parse::<ScoreMethod>().unwrap(), ScoreMethod::Var);
        assert_eq!("hhi".parse::<ScoreMethod>().unwrap(), ScoreMethod::Hhi);
        assert!("sharpe".parse::<ScoreMethod>().is_err());
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let record = RiskSnapshotRecord {
            public_key: "abc".to_string(),
            risk_score: 42,
            timestamp: 1_700_000_000,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["publicKey"], "abc");
        assert_eq!(json["riskScore"], 42);
    }
}
