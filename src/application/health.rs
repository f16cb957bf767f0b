//! Health monitoring service
//!
//! Tracks the health of the polling engine and each external dependency.
//! The engine reports on every tick; a background probe refreshes the RPC
//! and Telegram entries.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Component names used across the application
pub mod components {
    pub const ENGINE: &str = "engine";
    pub const SOLANA_RPC: &str = "solana_rpc";
    pub const PRICE_FEED: &str = "price_feed";
    pub const TELEGRAM: &str = "telegram";
}

/// Overall system health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All components are healthy
    Healthy,
    /// Some non-critical components are unhealthy
    Degraded,
    /// Critical components are unhealthy
    Unhealthy,
    /// System is starting up
    Starting,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "Healthy"),
            HealthStatus::Degraded => write!(f, "Degraded"),
            HealthStatus::Unhealthy => write!(f, "Unhealthy"),
            HealthStatus::Starting => write!(f, "Starting"),
        }
    }
}

/// Health status of an individual component
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,

    /// Current health status
    pub status: HealthStatus,

    /// Health check message
    pub message: Option<String>,

    /// Last successful health check
    pub last_success: Option<DateTime<Utc>>,

    /// Last health check attempt
    pub last_check: DateTime<Utc>,

    /// Number of consecutive failures
    pub consecutive_failures: u32,

    /// Whether this component is critical for overall system health
    pub is_critical: bool,

    /// Response time for last health check (in milliseconds)
    pub response_time_ms: Option<u64>,
}

impl ComponentHealth {
    /// Create a new component health status
    pub fn new<S: Into<String>>(name: S, is_critical: bool) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Starting,
            message: None,
            last_success: None,
            last_check: Utc::now(),
            consecutive_failures: 0,
            is_critical,
            response_time_ms: None,
        }
    }

    /// Mark component as healthy
    pub fn mark_healthy(&mut self, message: Option<String>, response_time_ms: Option<u64>) {
        self.status = HealthStatus::Healthy;
        self.message = message;
        self.last_success = Some(Utc::now());
        self.last_check = Utc::now();
        self.consecutive_failures = 0;
        self.response_time_ms = response_time_ms;
    }

    /// Mark component as unhealthy
    pub fn mark_unhealthy(&mut self, message: String) {
        self.status = HealthStatus::Unhealthy;
        self.message = Some(message);
        self.last_check = Utc::now();
        self.consecutive_failures += 1;
        self.response_time_ms = None;
    }

    /// Mark component as degraded
    pub fn mark_degraded(&mut self, message: String, response_time_ms: Option<u64>) {
        self.status = HealthStatus::Degraded;
        self.message = Some(message);
        self.last_check = Utc::now();
        self.response_time_ms = response_time_ms;
    }
}

/// Health registry shared between the engine, the probe and the API
#[derive(Debug, Clone)]
pub struct HealthService {
    components: Arc<RwLock<BTreeMap<String, ComponentHealth>>>,
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthService {
    /// Create a registry with the standard components in `Starting` state
    pub fn new() -> Self {
        let mut map = BTreeMap::new();
        for (name, critical) in [
            (components::ENGINE, true),
            (components::SOLANA_RPC, true),
            (components::PRICE_FEED, true),
            (components::TELEGRAM, false),
        ] {
            map.insert(name.to_string(), ComponentHealth::new(name, critical));
        }

        Self {
            components: Arc::new(RwLock::new(map)),
        }
    }

    /// Apply an update to a component, registering it as non-critical if unknown
    pub fn update<F>(&self, name: &str, f: F)
    where
        F: FnOnce(&mut ComponentHealth),
    {
        let mut components = self.components.write();
        let component = components
            .entry(name.to_string())
            .or_insert_with(|| ComponentHealth::new(name, false));
        f(component);
    }

    /// Replace a component with a freshly probed status, keeping its failure count
    pub fn record(&self, probed: ComponentHealth) {
        let mut components = self.components.write();
        match components.get_mut(&probed.name) {
            Some(existing) => {
                let failures = match probed.status {
                    HealthStatus::Unhealthy => existing.consecutive_failures + 1,
                    _ => 0,
                };
                *existing = ComponentHealth {
                    consecutive_failures: failures,
                    is_critical: existing.is_critical,
                    last_success: probed.last_success.or(existing.last_success),
                    ..probed
                };
            }
            None => {
                components.insert(probed.name.clone(), probed);
            }
        }
    }

    /// Get the overall system health status
    pub fn overall(&self) -> HealthStatus {
        let components = self.components.read();

        let mut has_critical_failure = false;
        let mut has_degraded = false;
        let mut all_starting = true;

        for component in components.values() {
            match component.status {
                HealthStatus::Unhealthy if component.is_critical => {
                    has_critical_failure = true;
                }
                HealthStatus::Unhealthy | HealthStatus::Degraded => {
                    has_degraded = true;
                }
                HealthStatus::Healthy => {
                    all_starting = false;
                }
                HealthStatus::Starting => {}
            }
        }

        if has_critical_failure {
            HealthStatus::Unhealthy
        } else if has_degraded {
            HealthStatus::Degraded
        } else if all_starting {
            HealthStatus::Starting
        } else {
            HealthStatus::Healthy
        }
    }

    /// Get health status for a specific component
    pub fn component(&self, name: &str) -> Option<ComponentHealth> {
        self.components.read().get(name).cloned()
    }

    /// Get health status for all components, ordered by name
    pub fn all(&self) -> Vec<ComponentHealth> {
        self.components.read().values().cloned().collect()
    }

    /// Get health summary as a formatted string
    pub fn summary(&self) -> String {
        let mut summary = format!("Overall Status: {}\n\nComponents:\n", self.overall());

        for component in self.components.read().values() {
            let status_emoji = match component.status {
                HealthStatus::Healthy => "✅",
                HealthStatus::Degraded => "⚠️",
                HealthStatus::Unhealthy => "❌",
                HealthStatus::Starting => "🔄",
            };
            let criticality = if component.is_critical { " (Critical)" } else { "" };

            summary.push_str(&format!(
                "{} {}{}: {}",
                status_emoji, component.name, criticality, component.status
            ));
            if let Some(ref message) = component.message {
                summary.push_str(&format!(" - {}", message));
            }
            if let Some(response_time) = component.response_time_ms {
                summary.push_str(&format!(" ({}ms)", response_time));
            }
            summary.push('\n');
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_health_lifecycle() {
        let mut component = ComponentHealth::new("test", true);

        assert!(matches!(component.status, HealthStatus::Starting));
        assert_eq!(component.consecutive_failures, 0);

        component.mark_healthy(Some("All good".to_string()), Some(100));
        assert!(matches!(component.status, HealthStatus::Healthy));
        assert!(component.last_success.is_some());

        component.mark_unhealthy("Something failed".to_string());
        component.mark_unhealthy("Still failing".to_string());
        assert_eq!(component.consecutive_failures, 2);
    }

    #[test]
    fn test_overall_health_calculation() {
        let health = HealthService::new();
        assert_eq!(health.overall(), HealthStatus::Starting);

        health.update(components::ENGINE, |c| c.mark_healthy(None, None));
        assert_eq!(health.overall(), HealthStatus::Healthy);

        health.update(components::TELEGRAM, |c| c.mark_degraded("disabled".to_string(), None));
        assert_eq!(health.overall(), HealthStatus::Degraded);

        health.update(components::PRICE_FEED, |c| c.mark_unhealthy("429".to_string()));
        assert_eq!(health.overall(), HealthStatus::Unhealthy);
    }

    #[test]
    fn test_record_keeps_criticality_and_counts_failures() {
        let health = HealthService::new();

        let mut probed = ComponentHealth::new(components::SOLANA_RPC, false);
        probed.mark_unhealthy("down".to_string());
        health.record(probed.clone());
        health.record(probed);

        let rpc = health.component(components::SOLANA_RPC).unwrap();
        assert!(rpc.is_critical);
        assert_eq!(rpc.consecutive_failures, 2);
    }

    #[test]
    fn test_summary_lists_components() {
        let health = HealthService::new();
        let summary = health.summary();
        assert!(summary.contains("Overall Status: Starting"));
        assert!(summary.contains("engine (Critical)"));
        assert_eq!(health.all().len(), 4);
    }
}
