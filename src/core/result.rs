//! Result type definitions and utilities for the application
//!
//! This module provides convenient result type aliases and utility functions
//! for working with results throughout the risk monitor.

use crate::core::error::AppError;

/// Application result type alias
///
/// # Examples
///
/// ```rust
/// use sentra_risk_monitor::core::result::AppResult;
/// use sentra_risk_monitor::core::error::AppError;
///
/// fn example_function() -> AppResult<String> {
///     Ok("Success".to_string())
/// }
///
/// fn failing_function() -> AppResult<()> {
///     Err(AppError::validation("Invalid input"))
/// }
/// ```
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Extension trait for `Result` to provide additional utility methods
pub trait ResultExt<T> {
    /// Map an error to a configuration error, keeping the original message
    fn map_config_err<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String;

    /// Map an error to a validation error with field context
    fn map_validation_err<F>(self, field: &str, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn map_config_err<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::config(format!("{}: {}", f(), e)))
    }

    fn map_validation_err<F>(self, field: &str, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::invalid_field(field, format!("{}: {}", f(), e)))
    }
}

/// Utility functions for working with results
pub mod utils {
    use super::*;
    use std::future::Future;
    use tokio::time::{timeout, Duration};

    /// Execute a future with a timeout, converting timeout to AppError
    pub async fn with_timeout<F, T>(
        duration: Duration,
        operation: &str,
        future: F,
    ) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match timeout(duration, future).await {
            Ok(result) => result,
            Err(_) => Err(AppError::timeout(
                operation.to_string(),
                duration.as_millis() as u64,
            )),
        }
    }
}

/// Return early with the given error when a condition does not hold
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}
