//! CoinGecko price API client
//!
//! Spot prices come from `/simple/price` in one batched request; history comes
//! from `/coins/{id}/market_chart`, one request per asset.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::models::PricingConfig;
use crate::core::error::AppError;
use crate::core::ports::PriceFeed;
use crate::core::result::AppResult;
use crate::core::types::TrackedAsset;

/// Header carrying a CoinGecko demo API key
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// `market_chart` response; only the price column is used
#[derive(Debug, Deserialize)]
struct MarketChart {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}

/// CoinGecko API client
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    /// HTTP client
    http_client: Client,
    /// API configuration
    config: PricingConfig,
}

impl CoinGeckoClient {
    /// Create a new CoinGecko client
    pub fn new(config: &PricingConfig) -> AppResult<Self> {
        info!("🦎 Initializing CoinGecko client: {}", config.base_url);

        let http_client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);

        let mut request = self.http_client.get(&url).query(params);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("⚠️  CoinGecko rate limit hit");
            }
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::pricing(format!("CoinGecko API error ({}): {}", status, body))
                .with_status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::pricing(format!("Failed to parse CoinGecko response: {}", e)))
    }

    /// Spot prices keyed by asset symbol
    ///
    /// Assets the API omits get their fallback price, or zero.
    #[instrument(skip(self, assets), fields(count = assets.len()))]
    pub async fn fetch_live_prices(&self, assets: &[TrackedAsset]) -> AppResult<HashMap<String, f64>> {
        let ids = assets
            .iter()
            .map(|a| a.coingecko_id.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let quotes: HashMap<String, HashMap<String, Option<f64>>> = self
            .get_json(
                "/simple/price",
                &[
                    ("ids", ids.as_str()),
                    ("vs_currencies", self.config.vs_currency.as_str()),
                ],
            )
            .await?;

        let prices = assets
            .iter()
            .map(|asset| {
                let quoted = quotes
                    .get(&asset.coingecko_id)
                    .and_then(|q| q.get(&self.config.vs_currency).copied().flatten());
                let price = match (quoted, asset.fallback_price) {
                    (Some(price), _) => price,
                    (None, Some(fallback)) => fallback,
                    (None, None) => {
                        debug!("No quote for {}, pricing at zero", asset.symbol);
                        0.0
                    }
                };
                (asset.symbol.clone(), price)
            })
            .collect();

        Ok(prices)
    }

    /// Historical prices for one coin, oldest first
    #[instrument(skip(self))]
    pub async fn fetch_history(&self, coin_id: &str) -> AppResult<Vec<f64>> {
        let days = self.config.history_days.to_string();
        let chart: MarketChart = self
            .get_json(
                &format!("/coins/{}/market_chart", coin_id),
                &[
                    ("vs_currency", self.config.vs_currency.as_str()),
                    ("days", days.as_str()),
                ],
            )
            .await
            .map_err(|e| e.with_asset(coin_id))?;

        debug!("📈 {} history points for {}", chart.prices.len(), coin_id);
        Ok(chart.prices.into_iter().map(|(_, price)| price).collect())
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoClient {
    async fn live_prices(&self, assets: &[TrackedAsset]) -> AppResult<HashMap<String, f64>> {
        self.fetch_live_prices(assets).await
    }

    async fn price_history(&self, asset: &TrackedAsset) -> AppResult<Vec<f64>> {
        self.fetch_history(&asset.coingecko_id).await
    }
}
