// src/error.rs

//! Unified error handling for the republisher.

use std::fmt;

use thiserror::Error;

/// Result type alias for republisher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
///
/// Network failures during harvesting are not represented here: the
/// transport converts them into [`crate::utils::http::Fetched::Absent`] and
/// the pipeline treats them as missing data.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Platform authorization failed
    #[error("Authorization failed: {0}")]
    Auth(String),

    /// The cursor store has never been initialized
    #[error("Cursor store at {location} is not initialized; run `reposter init --after <start>` first")]
    StoreNotInitialized { location: String },

    /// Refusing to overwrite an existing cursor
    #[error("Cursor store at {location} is already initialized (use --force to overwrite)")]
    AlreadyInitialized { location: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an authorization error.
    pub fn auth(message: impl fmt::Display) -> Self {
        Self::Auth(message.to_string())
    }

    /// Create a store-not-initialized error for a store location.
    pub fn store_not_initialized(location: impl Into<String>) -> Self {
        Self::StoreNotInitialized {
            location: location.into(),
        }
    }
}
