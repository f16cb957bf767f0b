//! The polling risk engine
//!
//! Each tick prices the wallet, checks the watched asset for a sudden drop,
//! refreshes cached return series when stale, computes HHI and VaR, publishes
//! the result, raises alerts, and optionally records the score on chain.

use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::health::{components, HealthStatus};
use super::state::SharedState;
use crate::config::models::EngineConfig;
use crate::core::domain::risk::MIN_HISTORY_POINTS;
use crate::core::ports::{AlertSink, Ledger, PriceFeed};
use crate::core::result::{utils::with_timeout, AppResult};
use crate::core::types::{PortfolioValuation, RiskAssessment, ScoreMethod, TrackedAsset};
use crate::infrastructure::monitoring::metrics::{self as telemetry, TickLabel};
use crate::services::alerts::{Alert, AlertGate};
use crate::services::risk;
use crate::utils::unix_timestamp;

/// Why a tick produced no assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Wallet holds nothing of value
    EmptyPortfolio,
    /// No asset has a usable return series yet
    WaitingForHistory,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPortfolio => write!(f, "portfolio value is zero"),
            Self::WaitingForHistory => write!(f, "waiting for historical data"),
        }
    }
}

/// Result of one engine tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Skipped(SkipReason),
    Assessed(RiskAssessment),
}

/// Cached return series keyed by asset symbol
#[derive(Debug, Default)]
struct ReturnHistory {
    returns: HashMap<String, Vec<f64>>,
    fetched_at: Option<Instant>,
}

impl ReturnHistory {
    fn is_stale(&self, config: &EngineConfig) -> bool {
        match self.fetched_at {
            _ if self.returns.is_empty() => true,
            None => true,
            Some(at) => at.elapsed() >= config.history_refresh_interval(),
        }
    }
}

/// Periodic portfolio risk assessment
pub struct RiskEngine {
    prices: Arc<dyn PriceFeed>,
    ledger: Arc<dyn Ledger>,
    alerts: Arc<dyn AlertSink>,
    config: EngineConfig,
    assets: Vec<TrackedAsset>,
    state: SharedState,
    history: ReturnHistory,
    last_shock_price: Option<f64>,
    gate: AlertGate,
}

impl fmt::Debug for RiskEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskEngine")
            .field("config", &self.config)
            .field("assets", &self.assets.len())
            .field("last_shock_price", &self.last_shock_price)
            .finish()
    }
}

impl RiskEngine {
    pub fn new(
        prices: Arc<dyn PriceFeed>,
        ledger: Arc<dyn Ledger>,
        alerts: Arc<dyn AlertSink>,
        config: EngineConfig,
        assets: Vec<TrackedAsset>,
        state: SharedState,
    ) -> Self {
        let gate = AlertGate::new(config.alert_cooldown());
        Self {
            prices,
            ledger,
            alerts,
            config,
            assets,
            state,
            history: ReturnHistory::default(),
            last_shock_price: None,
            gate,
        }
    }

    /// Run ticks on the configured interval until cancelled
    ///
    /// The first tick fires immediately.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            "🔁 Risk engine started: every {:?}, {} assets, score method {}",
            self.config.monitor_interval(),
            self.assets.len(),
            self.config.score_method
        );

        let mut ticker = interval(self.config.monitor_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.run_tick().await,
            }
        }

        info!("🛑 Risk engine stopped");
    }

    /// One bounded tick; errors are logged and never escape
    pub async fn run_tick(&mut self) {
        let started = Instant::now();
        let timeout = self.config.tick_timeout();

        let result = with_timeout(timeout, "engine_tick", self.tick()).await;
        let label = match result {
            Ok(TickOutcome::Assessed(assessment)) => {
                info!(
                    "📊 Risk {:.2} ({}), portfolio {:.2}, HHI {:.4}, VaR {:.2}",
                    assessment.risk_score,
                    assessment.method,
                    assessment.portfolio.total_value,
                    assessment.hhi,
                    assessment.value_at_risk
                );
                self.state.health().update(components::ENGINE, |c| {
                    c.mark_healthy(
                        Some("Last tick assessed".to_string()),
                        Some(started.elapsed().as_millis() as u64),
                    )
                });
                TickLabel::Assessed
            }
            Ok(TickOutcome::Skipped(reason)) => {
                info!("⏭️  Tick skipped: {}", reason);
                self.state.health().update(components::ENGINE, |c| {
                    c.mark_healthy(Some(format!("Last tick skipped: {}", reason)), None)
                });
                TickLabel::Skipped
            }
            Err(e) => {
                error!("❌ Engine tick failed: {}", e);
                telemetry::record_error(&e);
                self.state
                    .health()
                    .update(components::ENGINE, |c| c.mark_unhealthy(e.to_string()));
                TickLabel::Failed
            }
        };

        telemetry::record_tick(label, started.elapsed());
    }

    /// Run one assessment
    #[instrument(skip(self))]
    pub async fn tick(&mut self) -> AppResult<TickOutcome> {
        let prices = self.fetch_prices().await?;
        let balances = self.fetch_balances().await?;

        let portfolio = PortfolioValuation::build(&self.assets, &balances, &prices);
        if portfolio.total_value <= 0.0 {
            return Ok(TickOutcome::Skipped(SkipReason::EmptyPortfolio));
        }

        self.check_market_shock(&prices).await;

        if self.history.is_stale(&self.config) {
            self.refresh_history().await;
        }
        if self.history.returns.is_empty() {
            return Ok(TickOutcome::Skipped(SkipReason::WaitingForHistory));
        }

        let assessment = self.assess(portfolio)?;
        self.state.publish(assessment.clone());
        telemetry::record_assessment(&assessment);

        if assessment.risk_score >= self.config.risk_alert_threshold {
            self.raise(Alert::HighRisk {
                score: assessment.risk_score,
            })
            .await;
        }

        if self.config.record_on_chain {
            let score = assessment.on_chain_score();
            if let Err(e) = self
                .ledger
                .record_risk_score(score, unix_timestamp())
                .await
            {
                warn!("⚠️  Failed to record risk score on chain: {}", e);
                telemetry::record_error(&e);
            }
        }

        Ok(TickOutcome::Assessed(assessment))
    }

    /// Drop cached history so the next tick refetches it
    pub fn invalidate_history(&mut self) {
        self.history = ReturnHistory::default();
    }

    async fn fetch_prices(&self) -> AppResult<HashMap<String, f64>> {
        let health = self.state.health();
        match self.prices.live_prices(&self.assets).await {
            Ok(prices) => {
                health.update(components::PRICE_FEED, |c| c.mark_healthy(None, None));
                Ok(prices)
            }
            Err(e) => {
                health.update(components::PRICE_FEED, |c| c.mark_unhealthy(e.to_string()));
                Err(e)
            }
        }
    }

    async fn fetch_balances(&self) -> AppResult<crate::core::types::WalletBalances> {
        let health = self.state.health();
        match self.ledger.wallet_balances().await {
            Ok(balances) => {
                health.update(components::SOLANA_RPC, |c| c.mark_healthy(None, None));
                Ok(balances)
            }
            Err(e) => {
                health.update(components::SOLANA_RPC, |c| c.mark_unhealthy(e.to_string()));
                Err(e)
            }
        }
    }

    async fn check_market_shock(&mut self, prices: &HashMap<String, f64>) {
        // A zero quote is the price feed's placeholder for a missing asset
        let Some(current) = prices
            .get(&self.config.shock_asset)
            .copied()
            .filter(|p| *p > 0.0)
        else {
            debug!("No price for shock asset {}", self.config.shock_asset);
            return;
        };

        if let Some(previous) = self.last_shock_price.filter(|p| *p != 0.0) {
            let change_percent = (current - previous) / previous * 100.0;
            debug!("{} moved {:.2}% since last tick", self.config.shock_asset, change_percent);

            if change_percent <= -self.config.shock_threshold_percent {
                self.raise(Alert::MarketShock {
                    symbol: self.config.shock_asset.clone(),
                    change_percent,
                })
                .await;
            }
        }

        self.last_shock_price = Some(current);
    }

    async fn refresh_history(&mut self) {
        info!("📈 Refreshing price history for {} assets", self.assets.len());

        let prices = &self.prices;
        let fetches = self
            .assets
            .iter()
            .map(|asset| async move { (asset, prices.price_history(asset).await) });
        let results = join_all(fetches).await;

        let mut returns = HashMap::new();
        for (asset, result) in results {
            match result {
                Ok(history) if history.len() >= MIN_HISTORY_POINTS => {
                    returns.insert(asset.symbol.clone(), risk::compute_returns(&history));
                }
                Ok(history) => {
                    debug!("Not enough history for {} ({} points)", asset.symbol, history.len());
                }
                Err(e) => {
                    warn!("⚠️  History fetch failed for {}: {}", asset.symbol, e);
                }
            }
        }

        self.history = ReturnHistory {
            returns,
            fetched_at: Some(Instant::now()),
        };
    }

    fn assess(&self, portfolio: PortfolioValuation) -> AppResult<RiskAssessment> {
        let weights = portfolio.weights();
        let hhi = risk::compute_hhi(&weights);

        // VaR only covers assets with a cached return series
        let (var_weights, matrix): (Vec<f64>, Vec<Vec<f64>>) = self
            .assets
            .iter()
            .zip(&weights)
            .filter_map(|(asset, weight)| {
                self.history
                    .returns
                    .get(&asset.symbol)
                    .map(|series| (*weight, series.clone()))
            })
            .unzip();

        let var = risk::calculate_var(
            portfolio.total_value,
            &var_weights,
            &matrix,
            self.config.confidence_z,
        )?;
        let hhi_score = risk::hhi_score(hhi);

        let risk_score = match self.config.score_method {
            ScoreMethod::Var => var.risk_score,
            ScoreMethod::Hhi => hhi_score,
        };

        Ok(RiskAssessment {
            portfolio,
            variance: var.variance,
            sigma: var.sigma,
            value_at_risk: var.value_at_risk,
            var_score: var.risk_score,
            hhi,
            hhi_score,
            method: self.config.score_method,
            risk_score,
            assessed_at: Utc::now(),
        })
    }

    async fn raise(&mut self, alert: Alert) {
        let now = Instant::now();
        if !self.gate.allow(now) {
            debug!("🔕 Alert suppressed by cooldown: {}", alert.kind());
            return;
        }

        match self.alerts.send(&alert).await {
            Ok(()) => {
                self.gate.record(now);
                telemetry::record_alert(alert.kind());
                self.state.health().update(components::TELEGRAM, |c| {
                    if c.status != HealthStatus::Degraded {
                        c.mark_healthy(Some("Last alert delivered".to_string()), None)
                    }
                });
            }
            Err(e) => {
                warn!("⚠️  Alert delivery failed: {}", e);
                telemetry::record_error(&e);
                self.state
                    .health()
                    .update(components::TELEGRAM, |c| c.mark_unhealthy(e.to_string()));
            }
        }
    }
}
