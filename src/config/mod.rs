//! Configuration management module
//!
//! Layered loading (defaults, files, environment, CLI) and validation of the
//! monitor's configuration.

pub mod loader;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use loader::{load_config, load_config_with_args, ConfigLoader};
pub use models::AppConfig;
pub use validation::{ConfigValidator, ValidationResult};

// Re-export CLI args from utils for convenience
pub use crate::utils::CliArgs;
