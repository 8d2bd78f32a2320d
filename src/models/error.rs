//! Error types for flexion.
//!
//! Three broad families:
//! - Expected failures (bad input, bad config): reported immediately, never retried
//! - Remote failures (network, timeout, bad status): absorbed by the retry layer
//! - Internal failures (IO, serialization, bugs): propagated with context

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for flexion.
#[derive(Debug, Error)]
pub enum FlexionError {
    // ═══════════════════════════════════════════════════════════════════
    // Expected failures — caller-attributable, never retried
    // ═══════════════════════════════════════════════════════════════════

    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("Data validation failed: {0}")]
    Validation(#[from] DataValidationError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Parse error: {0}")]
    ParseError(String),

    // ═══════════════════════════════════════════════════════════════════
    // Remote failures — transient, retried by the Invoker
    // ═══════════════════════════════════════════════════════════════════

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Remote call failed (status {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Internal failures — bugs or environment problems
    // ═══════════════════════════════════════════════════════════════════

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Structural dataset checks, one variant per check, in check order.
#[derive(Debug, Error)]
pub enum DataValidationError {
    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Insufficient data: {rows} rows, at least {min} required")]
    InsufficientRows { rows: usize, min: usize },

    #[error("Null value in column '{column}' at row {row}")]
    NullValue { column: String, row: usize },
}

impl FlexionError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether the retry layer may absorb this failure and try again.
    ///
    /// Only remote-boundary failures qualify. Everything else propagates
    /// out of the retry loop on the first occurrence.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::Remote { .. }
        )
    }

    /// Whether this error should surface to external callers verbatim.
    ///
    /// Everything else is reported as a generic internal failure so that
    /// IO paths and bug details never leak through the inference response.
    pub fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_) | Self::RetriesExhausted { .. }
        )
    }
}

/// Result type alias for flexion.
pub type Result<T> = std::result::Result<T, FlexionError>;
