//! Process-local status shared between the engine and the HTTP API

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::health::HealthService;
use crate::core::types::RiskAssessment;

/// Latest engine output plus health, cheap to clone
#[derive(Debug, Clone)]
pub struct SharedState {
    latest: Arc<RwLock<Option<RiskAssessment>>>,
    health: HealthService,
    started_at: Instant,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            latest: Arc::new(RwLock::new(None)),
            health: HealthService::new(),
            started_at: Instant::now(),
        }
    }

    /// Replace the latest assessment
    pub fn publish(&self, assessment: RiskAssessment) {
        *self.latest.write() = Some(assessment);
    }

    /// Most recent assessment, if any tick completed
    pub fn latest(&self) -> Option<RiskAssessment> {
        self.latest.read().clone()
    }

    pub fn health(&self) -> &HealthService {
        &self.health
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{PortfolioValuation, ScoreMethod};
    use chrono::Utc;

    #[test]
    fn test_publish_is_visible_to_clones() {
        let state = SharedState::new();
        let reader = state.clone();
        assert!(reader.latest().is_none());

        state.publish(RiskAssessment {
            portfolio: PortfolioValuation::default(),
            variance: 0.0,
            sigma: 0.0,
            value_at_risk: 0.0,
            var_score: 12.0,
            hhi: 0.5,
            hhi_score: 50.0,
            method: ScoreMethod::Var,
            risk_score: 12.0,
            assessed_at: Utc::now(),
        });

        assert_eq!(reader.latest().map(|a| a.risk_score), Some(12.0));
    }
}
