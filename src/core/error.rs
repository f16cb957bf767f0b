//! Application error types and error handling utilities
//!
//! This module defines the error system for the risk monitor. Every fallible
//! operation in the library returns [`AppResult`], and every external
//! integration (RPC node, price API, Telegram, configuration sources) maps its
//! native error into one of the [`AppError`] variants below.

use thiserror::Error;

/// Main application error type that encompasses all possible errors
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
    },

    /// Network and HTTP communication errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        endpoint: Option<String>,
        status_code: Option<u16>,
    },

    /// Solana RPC and program errors
    #[error("Solana error: {message}")]
    Solana {
        message: String,
        transaction_signature: Option<String>,
    },

    /// Price API errors
    #[error("Pricing error: {message}")]
    Pricing {
        message: String,
        asset: Option<String>,
        status_code: Option<u16>,
    },

    /// Alert delivery errors
    #[error("Alert error: {message}")]
    Alert {
        message: String,
    },

    /// Risk computation errors
    #[error("Risk computation error: {message}")]
    Risk {
        message: String,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },

    /// Timeout errors
    #[error("Timeout error: {operation} exceeded {duration_ms}ms")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },
}

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration and setup errors
    Configuration,
    /// Network and communication errors
    Network,
    /// Business logic errors
    Business,
    /// External service integration errors
    Integration,
    /// Performance and timeout errors
    Performance,
    /// Validation and input errors
    Validation,
    /// System and infrastructure errors
    System,
}

impl ErrorKind {
    /// Stable lowercase label, used for metric labels and structured logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Network => "network",
            Self::Business => "business",
            Self::Integration => "integration",
            Self::Performance => "performance",
            Self::Validation => "validation",
            Self::System => "system",
        }
    }
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            endpoint: None,
            status_code: None,
        }
    }

    /// Create a new Solana error
    pub fn solana<S: Into<String>>(message: S) -> Self {
        Self::Solana {
            message: message.into(),
            transaction_signature: None,
        }
    }

    /// Create a new pricing error
    pub fn pricing<S: Into<String>>(message: S) -> Self {
        Self::Pricing {
            message: message.into(),
            asset: None,
            status_code: None,
        }
    }

    /// Create a new alert delivery error
    pub fn alert<S: Into<String>>(message: S) -> Self {
        Self::Alert {
            message: message.into(),
        }
    }

    /// Create a new risk computation error
    pub fn risk<S: Into<String>>(message: S) -> Self {
        Self::Risk {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error bound to a specific field
    pub fn invalid_field<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(operation: S, duration_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration_ms,
        }
    }

    /// Attach the endpoint that produced a network error
    pub fn with_endpoint<S: Into<String>>(mut self, value: S) -> Self {
        if let Self::Network { endpoint, .. } = &mut self {
            *endpoint = Some(value.into());
        }
        self
    }

    /// Attach the asset a pricing error refers to
    pub fn with_asset<S: Into<String>>(mut self, value: S) -> Self {
        if let Self::Pricing { asset, .. } = &mut self {
            *asset = Some(value.into());
        }
        self
    }

    /// Attach an HTTP status code to network and pricing errors
    pub fn with_status(mut self, code: u16) -> Self {
        match &mut self {
            Self::Network { status_code, .. } | Self::Pricing { status_code, .. } => {
                *status_code = Some(code);
            }
            _ => {}
        }
        self
    }

    /// Get the error category
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Configuration,
            Self::Network { .. } | Self::Solana { .. } => ErrorKind::Network,
            Self::Risk { .. } => ErrorKind::Business,
            Self::Pricing { .. } | Self::Alert { .. } => ErrorKind::Integration,
            Self::Timeout { .. } => ErrorKind::Performance,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Internal { .. } => ErrorKind::System,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { status_code, .. } | Self::Pricing { status_code, .. } => {
                // 4xx other than rate limiting will not get better on retry
                !matches!(status_code, Some(code) if (400..500).contains(code) && *code != 429)
            }
            Self::Timeout { .. } | Self::Solana { .. } => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::validation(format!("JSON serialization error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::config(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("IO error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let mut error = Self::network(format!("HTTP request error: {}", err));
        if let Some(status) = err.status() {
            error = error.with_status(status.as_u16());
        }
        if let Some(url) = err.url() {
            error = error.with_endpoint(url.as_str());
        }
        error
    }
}

impl From<solana_client::client_error::ClientError> for AppError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        Self::solana(format!("RPC client error: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::timeout("unknown", 0)
    }
}
