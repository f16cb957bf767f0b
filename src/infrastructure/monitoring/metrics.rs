//! Metrics reporting
//!
//! Everything goes through the `metrics` facade. Without an installed
//! recorder the calls are no-ops, so the engine never checks whether metrics
//! are enabled.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;
use tracing::info;

use crate::config::models::MonitoringConfig;
use crate::core::error::AppError;
use crate::core::result::AppResult;
use crate::core::types::RiskAssessment;

pub const RISK_SCORE: &str = "sentra_risk_score";
pub const PORTFOLIO_VALUE: &str = "sentra_portfolio_value_usd";
pub const PORTFOLIO_HHI: &str = "sentra_portfolio_hhi";
pub const VALUE_AT_RISK: &str = "sentra_value_at_risk_usd";
pub const ENGINE_TICKS: &str = "sentra_engine_ticks_total";
pub const ALERTS_SENT: &str = "sentra_alerts_sent_total";
pub const TICK_DURATION: &str = "sentra_tick_duration_seconds";
pub const ERRORS: &str = "sentra_errors_total";

/// Outcome label of one engine tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickLabel {
    Assessed,
    Skipped,
    Failed,
}

impl TickLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assessed => "assessed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Register metric descriptions with the installed recorder
pub fn describe() {
    describe_gauge!(RISK_SCORE, "Published portfolio risk score (0-100)");
    describe_gauge!(PORTFOLIO_VALUE, "Portfolio value in the quote currency");
    describe_gauge!(PORTFOLIO_HHI, "Herfindahl-Hirschman concentration index");
    describe_gauge!(VALUE_AT_RISK, "Parametric Value-at-Risk in the quote currency");
    describe_counter!(ENGINE_TICKS, "Engine ticks by outcome");
    describe_counter!(ALERTS_SENT, "Alerts delivered by kind");
    describe_counter!(ERRORS, "Errors by category");
    describe_histogram!(TICK_DURATION, "Duration of one engine tick in seconds");
}

/// Install the Prometheus exporter when enabled
#[cfg(feature = "prometheus")]
pub fn install(config: &MonitoringConfig) -> AppResult<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::{Ipv4Addr, SocketAddr};

    if !config.enable_metrics {
        return Ok(());
    }

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.metrics_port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| AppError::internal(format!("Failed to install Prometheus exporter: {}", e)))?;

    describe();
    info!("📊 Prometheus metrics exposed on {}", addr);
    Ok(())
}

/// Install the Prometheus exporter when enabled
#[cfg(not(feature = "prometheus"))]
pub fn install(config: &MonitoringConfig) -> AppResult<()> {
    if config.enable_metrics {
        return Err(AppError::config(
            "monitoring.enable_metrics is set but the binary was built without the `prometheus` feature",
        ));
    }
    info!("📊 Metrics exporter not compiled in");
    Ok(())
}

/// Publish the gauges of a completed assessment
pub fn record_assessment(assessment: &RiskAssessment) {
    gauge!(RISK_SCORE).set(assessment.risk_score);
    gauge!(PORTFOLIO_VALUE).set(assessment.portfolio.total_value);
    gauge!(PORTFOLIO_HHI).set(assessment.hhi);
    gauge!(VALUE_AT_RISK).set(assessment.value_at_risk);
}

pub fn record_tick(outcome: TickLabel, elapsed: Duration) {
    counter!(ENGINE_TICKS, "outcome" => outcome.as_str()).increment(1);
    histogram!(TICK_DURATION).record(elapsed.as_secs_f64());
}

pub fn record_alert(kind: &'static str) {
    counter!(ALERTS_SENT, "kind" => kind).increment(1);
}

pub fn record_error(error: &AppError) {
    counter!(ERRORS, "kind" => error.kind().as_str()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calls_without_recorder_are_noops() {
        record_tick(TickLabel::Skipped, Duration::from_millis(5));
        record_alert("high_risk");
        record_error(&AppError::risk("x"));
        describe();
    }

    #[test]
    fn test_disabled_exporter_installs_nothing() {
        assert!(install(&MonitoringConfig::default()).is_ok());
    }

    #[test]
    fn test_tick_labels() {
        assert_eq!(TickLabel::Failed.as_str(), "failed");
    }
}
