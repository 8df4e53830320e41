//! Error handling for RDAP resolution.
//!
//! Only a few of these ever reach a caller of `check_domain`: invalid input
//! and setup problems. Transport and bootstrap failures are folded into an
//! `unknown` result by the resolver before they can escape.

use std::time::Duration;
use thiserror::Error;

/// Main error type for RDAP resolution operations.
#[derive(Error, Debug, Clone)]
pub enum RdapCheckError {
    /// Invalid domain name format
    #[error("Invalid domain '{domain}': {reason}")]
    InvalidDomain { domain: String, reason: String },

    /// Network-related errors (connection, DNS, TLS, etc.)
    #[error("Network error: {message}")]
    Network {
        message: String,
        detail: Option<String>,
    },

    /// An operation exceeded its deadline
    #[error("Timeout after {duration:?} during: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Bootstrap directory could not be fetched or understood
    #[error("Bootstrap error: {message}")]
    Bootstrap { message: String },

    /// JSON / TOML parsing errors
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Configuration errors (invalid settings, etc.)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// File I/O errors when reading configuration or domain lists
    #[error("File error at '{path}': {message}")]
    File { path: String, message: String },

    /// Generic internal errors that don't fit other categories
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RdapCheckError {
    /// Create a new invalid domain error.
    pub fn invalid_domain(domain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            detail: None,
        }
    }

    /// Create a new network error with the underlying cause attached.
    pub fn network_with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new bootstrap error.
    pub fn bootstrap(message: impl Into<String>) -> Self {
        Self::Bootstrap {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error was caused by the caller's input rather than the network.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDomain { .. } | Self::Config { .. } | Self::File { .. }
        )
    }
}

impl From<reqwest::Error> for RdapCheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::network_with_detail("Connection failed", err.to_string())
        } else if err.is_decode() {
            Self::Parse {
                message: format!("Response body could not be decoded: {}", err),
            }
        } else {
            Self::network_with_detail("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for RdapCheckError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: format!("JSON parsing failed: {}", err),
        }
    }
}

impl From<toml::de::Error> for RdapCheckError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}

impl From<std::io::Error> for RdapCheckError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("I/O error: {}", err))
    }
}
