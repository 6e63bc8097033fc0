//! Crate-level error types.
//!
//! [`TradeDeskError`] unifies every error source (configuration, HTTP
//! transport, backend rejections, JSON) behind a single enum so callers can
//! match on the variant they care about while still using the `?` operator
//! for easy propagation.

use rust_decimal::Decimal;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TradeDeskError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum TradeDeskError {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The request never produced a response (connect failure, timeout, ...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A response was well-formed JSON but did not match the expected shape.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// An authenticated endpoint was called before logging in.
    #[error("not logged in")]
    NotAuthenticated,

    /// A trade referenced a currency whose detail view was never opened.
    #[error("no quote for currency {0}; open it first")]
    UnknownCurrency(u32),

    /// Trade or deposit quantities must be strictly positive.
    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(Decimal),

    /// Terminal or stdin I/O failed.
    #[error("io error: {0}")]
    Io(String),
}

impl TradeDeskError {
    /// Returns `true` when the failure happened before any response arrived.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Returns the HTTP status for backend rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
