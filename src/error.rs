//! Custom error types for rustscopus.
//!
//! Extraction code distinguishes two failure modes: tolerant paths swallow
//! field-level problems and return `None`, strict paths surface one of the
//! variants below so the caller can skip, abort or propagate.

use thiserror::Error;

/// Main error type for rustscopus operations.
#[derive(Debug, Error)]
pub enum ScopusError {
    /// A mandatory field was absent from the source JSON
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A mandatory field was present but could not be interpreted
    #[error("Malformed value for {field}: {reason}")]
    MalformedValue {
        /// JSON key (or dotted path) of the offending value
        field: String,
        /// What was wrong with it
        reason: String,
    },

    /// Truncation window where the maximum lies before the minimum
    #[error("Minimum position {min} cannot be greater than maximum position {max}")]
    InvalidRange {
        min: usize,
        max: usize,
    },

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Rate limited by the Scopus API
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// Scopus API returned an error status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: i32,
        /// Error message
        message: String,
    },

    /// Scopus API answered with an empty body
    #[error("Empty response from Scopus API")]
    EmptyResponse,

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using `ScopusError`
pub type Result<T> = std::result::Result<T, ScopusError>;

impl ScopusError {
    /// Shorthand for [`ScopusError::MalformedValue`].
    pub fn malformed(field: &str, reason: impl Into<String>) -> Self {
        Self::MalformedValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Extension trait for turning an absent value into a `MissingField` error
pub trait OptionExt<T> {
    /// Convert Option to Result, naming the field that was missing
    fn ok_or_missing(self, field: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_missing(self, field: &str) -> Result<T> {
        self.ok_or_else(|| ScopusError::MissingField(field.to_string()))
    }
}
