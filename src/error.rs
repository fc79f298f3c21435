//! Error types for wallet-glance.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for wallet-glance operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Provider transport errors (endpoint unreachable, malformed response, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// The wallet refused to authorize this front-end.
    #[error("Authorization denied: {0}")]
    Authorization(String),

    /// Account or balance query errors.
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (invalid config file, bad URL, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (terminal setup, unexpected states, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    /// Creates a provider error with the given message.
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Creates an authorization error with the given message.
    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Provider(_) => "Provider Error",
            Self::Authorization(_) => "Authorization Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using WalletError.
pub type Result<T> = std::result::Result<T, WalletError>;
