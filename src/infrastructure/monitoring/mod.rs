//! Monitoring infrastructure module
//!
//! Metric names, the Prometheus exporter, and helpers the engine calls to
//! publish each assessment.

pub mod metrics;

// Re-export main types
pub use metrics::{install as install_metrics_exporter, TickLabel};
