//! Error types for tickfetch.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for tickfetch operations.
pub type Result<T> = std::result::Result<T, TickfetchError>;

/// Errors that can occur while fetching, decoding and writing tick data.
#[derive(Error, Debug)]
pub enum TickfetchError {
    /// The fetch configuration was rejected before any request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A slot could not be downloaded.
    #[error("error downloading {symbol} for {slot}: {message}")]
    Transport {
        /// The instrument being fetched.
        symbol: String,
        /// Start of the failing hour slot.
        slot: DateTime<Utc>,
        /// Transport failure, including the per-attempt history.
        message: String,
    },

    /// A slot payload could not be decoded.
    #[error("error decoding {symbol} for {slot}: {message}")]
    Decode {
        /// The instrument being fetched.
        symbol: String,
        /// Start of the failing hour slot.
        slot: DateTime<Utc>,
        /// Decoder failure.
        message: String,
    },

    /// The operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output format error.
    #[error("Format error: {0}")]
    Format(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TickfetchError {
    /// Returns true if this error was caused by cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Error for an invalid fetch configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Symbol is missing or shorter than the minimum length.
    #[error("invalid symbol '{0}': expected at least 3 characters")]
    Symbol(String),

    /// Concurrency must be positive.
    #[error("concurrency must be greater than zero")]
    Concurrency,

    /// A required field was not provided.
    #[error("missing required field: {0}")]
    Missing(&'static str),

    /// End precedes start.
    #[error("invalid time range: {start} > {end}")]
    InvalidRange {
        /// The start instant.
        start: DateTime<Utc>,
        /// The end instant.
        end: DateTime<Utc>,
    },
}
