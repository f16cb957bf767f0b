//! Application layer module
//!
//! The polling risk engine, the state it shares with the status API, health
//! tracking, and the lifecycle that runs them together.

pub mod api;
pub mod app;
pub mod engine;
pub mod health;
pub mod state;

// Re-export main application type
pub use app::Application;
pub use engine::{RiskEngine, SkipReason, TickOutcome};
pub use health::{ComponentHealth, HealthService, HealthStatus};
pub use state::SharedState;
