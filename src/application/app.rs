//! Main application structure and lifecycle management
//!
//! Wires the service container into the risk engine and the status API, and
//! runs both alongside a periodic dependency health probe until shutdown.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::api::{self, ApiState};
use super::engine::RiskEngine;
use super::health::{HealthService, HealthStatus};
use super::state::SharedState;
use crate::config::AppConfig;
use crate::core::error::AppError;
use crate::core::ports::{AlertSink, Ledger, PriceFeed, SnapshotStore};
use crate::core::result::AppResult;
use crate::infrastructure::monitoring::install_metrics_exporter;
use crate::services::ServiceContainer;

/// How often the RPC node and Telegram are probed
const HEALTH_PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Main application state and coordinator
#[derive(Debug)]
pub struct Application {
    config: Arc<AppConfig>,
    services: ServiceContainer,
    state: SharedState,
}

impl Application {
    /// Build a new application instance with the given configuration
    #[instrument(skip(config))]
    pub fn build(config: AppConfig) -> AppResult<Self> {
        info!("🏗️  Building application instance");

        let validation = config.validate()?;
        if !validation.is_valid {
            return Err(AppError::config(format!(
                "Configuration validation failed: {}",
                validation.errors.join("; ")
            )));
        }
        for warning in &validation.warnings {
            warn!("⚠️  Configuration warning: {}", warning);
        }

        let services = ServiceContainer::initialize(&config)?;

        info!("✅ Application instance built successfully");
        Ok(Self {
            config: Arc::new(config),
            services,
            state: SharedState::new(),
        })
    }

    /// A risk engine publishing into this application's state
    pub fn engine(&self) -> RiskEngine {
        let prices: Arc<dyn PriceFeed> = self.services.pricing.clone();
        let ledger: Arc<dyn Ledger> = self.services.solana.clone();
        let alerts: Arc<dyn AlertSink> = self.services.notifier.clone();

        RiskEngine::new(
            prices,
            ledger,
            alerts,
            self.config.engine.clone(),
            self.config.assets.clone(),
            self.state.clone(),
        )
    }

    fn api_state(&self) -> ApiState {
        let snapshots: Arc<dyn SnapshotStore> = self.services.solana.clone();
        ApiState::new(self.state.clone(), snapshots)
    }

    /// Run engine, API and health probe until `shutdown` is cancelled
    ///
    /// A server failure (e.g. the port is taken) cancels the other tasks and
    /// is returned.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: CancellationToken) -> AppResult<()> {
        info!("🚀 Starting Sentra risk monitor");

        install_metrics_exporter(&self.config.monitoring)?;

        let engine = tokio::spawn(self.engine().run(shutdown.child_token()));
        let probe = tokio::spawn(probe_health(
            self.services.clone(),
            self.state.health().clone(),
            shutdown.child_token(),
        ));

        let served = api::serve(&self.config.server, self.api_state(), shutdown.clone()).await;
        if let Err(e) = &served {
            error!("❌ Status API failed: {}", e);
            shutdown.cancel();
        }

        for (name, handle) in [("engine", engine), ("health probe", probe)] {
            if let Err(e) = handle.await {
                error!("{} task failed: {}", name, e);
            }
        }

        info!("👋 Sentra risk monitor stopped");
        served
    }

    /// Get application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn services(&self) -> &ServiceContainer {
        &self.services
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }
}

/// Periodically refresh dependency health from live probes
async fn probe_health(
    services: ServiceContainer,
    health: HealthService,
    shutdown: CancellationToken,
) {
    let mut ticker = interval(HEALTH_PROBE_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                for (_, component) in services.health_check().await {
                    health.record(component);
                }

                match health.overall() {
                    HealthStatus::Healthy => debug!("✅ All systems healthy"),
                    HealthStatus::Degraded => warn!("⚠️  System degraded - some components unhealthy"),
                    HealthStatus::Unhealthy => {
                        error!("❌ System unhealthy - critical components failed\n{}", health.summary())
                    }
                    HealthStatus::Starting => debug!("🔄 System starting up"),
                }
            }
        }
    }
}
