//! Solana-specific data types
//!
//! Raw shapes read from the RPC node before they are folded into
//! [`WalletBalances`](crate::core::types::WalletBalances).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::types::WalletBalances;

/// One SPL token account balance owned by the wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenHolding {
    /// Token account address
    pub account: String,
    /// Mint address
    pub mint: String,
    /// Balance in UI units (decimals applied)
    pub ui_amount: f64,
}

impl TokenHolding {
    /// Parse a `jsonParsed` SPL token account payload
    ///
    /// Returns `None` for accounts without a mint or a usable amount.
    pub fn from_parsed(account: &str, parsed: &serde_json::Value) -> Option<Self> {
        let info = parsed.get("info")?;
        let mint = info.get("mint")?.as_str()?;
        let token_amount = info.get("tokenAmount")?;

        let ui_amount = token_amount
            .get("uiAmount")
            .and_then(|v| v.as_f64())
            .or_else(|| {
                token_amount
                    .get("uiAmountString")
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse().ok())
            })?;

        Some(Self {
            account: account.to_string(),
            mint: mint.to_string(),
            ui_amount,
        })
    }
}

/// Fold a native balance and token holdings into wallet balances
///
/// Zero balances are dropped and multiple accounts of the same mint are summed.
pub fn aggregate_balances(sol: f64, holdings: &[TokenHolding]) -> WalletBalances {
    let mut tokens: HashMap<String, f64> = HashMap::new();
    for holding in holdings.iter().filter(|h| h.ui_amount > 0.0) {
        *tokens.entry(holding.mint.clone()).or_insert(0.0) += holding.ui_amount;
    }
    WalletBalances { sol, tokens }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    #[test]
    fn test_parse_token_account() {
        let parsed = json!({
            "type": "account",
            "info": {
                "mint": BONK,
                "owner": "11111111111111111111111111111111",
                "tokenAmount": {
                    "amount": "1500000",
                    "decimals": 5,
                    "uiAmount": 15.0,
                    "uiAmountString": "15"
                }
            }
        });

        let holding = TokenHolding::from_parsed("acct", &parsed).unwrap();
        assert_eq!(holding.mint, BONK);
        assert_eq!(holding.ui_amount, 15.0);
    }

    #[test]
    fn test_parse_falls_back_to_amount_string() {
        let parsed = json!({
            "info": {
                "mint": BONK,
                "tokenAmount": { "uiAmount": null, "uiAmountString": "2.5" }
            }
        });
        assert_eq!(TokenHolding::from_parsed("acct", &parsed).unwrap().ui_amount, 2.5);
    }

    #[test]
    fn test_parse_rejects_incomplete_payloads() {
        assert!(TokenHolding::from_parsed("acct", &json!({})).is_none());
        assert!(TokenHolding::from_parsed("acct", &json!({"info": {"mint": BONK}})).is_none());
    }

    #[test]
    fn test_aggregate_sums_and_drops_empty() {
        let holdings = vec![
            TokenHolding { account: "a".into(), mint: BONK.into(), ui_amount: 10.0 },
            TokenHolding { account: "b".into(), mint: BONK.into(), ui_amount: 5.0 },
            TokenHolding { account: "c".into(), mint: "empty".into(), ui_amount: 0.0 },
        ];
        let balances = aggregate_balances(1.5, &holdings);
        assert_eq!(balances.sol, 1.5);
        assert_eq!(balances.tokens.get(BONK), Some(&15.0));
        assert!(!balances.tokens.contains_key("empty"));
    }
}
