//! Error types for the library layer.

use std::fmt;

/// Errors produced by the library layer, wrapping fetch errors and adding
/// report serialization and input validation failures.
#[derive(Debug)]
pub enum TradingEconError {
    /// An error from the underlying fetch client.
    Fetch(tradingecon_http::Error),
    /// JSON serialization or deserialization failed.
    Serialization(serde_json::Error),
    /// A record or user-provided value failed validation.
    InvalidInput(String),
}

impl fmt::Display for TradingEconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "Fetch error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for TradingEconError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            Self::Serialization(e) => Some(e),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<tradingecon_http::Error> for TradingEconError {
    fn from(e: tradingecon_http::Error) -> Self {
        Self::Fetch(e)
    }
}

impl From<serde_json::Error> for TradingEconError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}
