//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.
//!
//! A missing DNS record is not represented here: the published-record reader
//! reports it as `Ok(None)`.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Network unreachable, connection reset or timeout
    #[error("Transport error: {0}")]
    Transport(String),

    /// The public-IP endpoint answered with something other than 200
    #[error("HTTP status {status} from {url}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// Returned status code
        status: u16,
    },

    /// Response body is not a dotted-quad IPv4 address
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    /// Malformed IPv4 literal or hostname
    #[error("Validation error: {0}")]
    Validation(String),

    /// DNS resolution failed for a reason other than "no such record"
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Upstream provider rejected or failed the write
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an HTTP status error
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Create an invalid format error
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
