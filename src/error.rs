// src/error.rs

//! Unified error handling for classification and dispatch.

use std::fmt;

use thiserror::Error;

use crate::models::Channel;

/// Result type alias for hotspot operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
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

    /// Malformed keyword grammar
    #[error("Keyword config error at line {line}: {message}")]
    Keyword { line: usize, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A single channel/account send failed
    #[error("{channel} send failed for {account}: {message}")]
    Channel {
        channel: Channel,
        account: String,
        message: String,
    },

    /// Upstream collaborator (fetcher, scorer) failed
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl AppError {
    /// Create a keyword grammar error for a 1-based line number.
    pub fn keyword(line: usize, message: impl fmt::Display) -> Self {
        Self::Keyword {
            line,
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a channel send error.
    pub fn channel(channel: Channel, account: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Channel {
            channel,
            account: account.into(),
            message: message.to_string(),
        }
    }

    /// Create an upstream collaborator error.
    pub fn upstream(message: impl fmt::Display) -> Self {
        Self::Upstream(message.to_string())
    }
}
