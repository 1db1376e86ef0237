//! Error types for the Respite suggestion pipeline

use std::time::Duration;
use thiserror::Error;

use crate::client::HTTP_TIMEOUT;

/// Result type alias for Respite operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Fallback(#[from] FallbackError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors returned by the generative content service
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("API key rejected by the generative service")]
    Unauthorized,

    #[error("API key is not allowed to use this model")]
    Forbidden,

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(HTTP_TIMEOUT)
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to API".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Failures inside the content generator.
///
/// `Upstream` and `Parse` are retried by the generator itself; only
/// `NoCredentials` and `AllAttemptsExhausted` leave `generate()`.
#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    #[error("No API keys configured. Set GEMINI_API_KEY_1..3 or GEMINI_API_KEY.")]
    NoCredentials,

    #[error("Upstream call failed: {0}")]
    Upstream(#[from] ApiError),

    #[error("Failed to parse generated suggestions: {0}")]
    Parse(String),

    #[error("All {attempts} generation attempts failed; last error: {last}")]
    AllAttemptsExhausted {
        attempts: u32,
        last: Box<GenerateError>,
    },
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Problems with the curated fallback table
#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("Fallback table is corrupt: {0}")]
    Corrupt(String),

    #[error("No fallback bucket for {0}")]
    MissingBucket(String),
}

impl From<serde_yaml::Error> for FallbackError {
    fn from(err: serde_yaml::Error) -> Self {
        FallbackError::Corrupt(err.to_string())
    }
}
