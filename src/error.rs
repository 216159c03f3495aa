//! Error types for the Turnstile service.

use thiserror::Error;

/// Main error type for Turnstile operations.
#[derive(Error, Debug)]
pub enum TurnstileError {
    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failures while layering configuration sources
    #[error("Configuration source error: {0}")]
    Settings(#[from] config::ConfigError),

    /// Self-test client errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Turnstile operations.
pub type Result<T> = std::result::Result<T, TurnstileError>;
