//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("No AI provider configured")]
    NoAiProviderConfigured,

    #[error("Auto-merge threshold must be between 0 and 1")]
    InvalidThreshold,

    #[error("Temperature must be between 0 and 2")]
    InvalidTemperature,

    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),

    #[error("Data directory must not be empty")]
    InvalidDataDir,
}
