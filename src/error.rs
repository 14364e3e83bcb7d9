//! Error types for MilkTrend
//!
//! Only hard faults live here: persisted state that cannot be written, input
//! files that cannot be read, invalid command-line values. Analytical edge
//! cases (too few readings, missing fields, zero variance) are represented as
//! values in the analysis results and never surface as errors.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for MilkTrend operations
#[derive(Error, Debug)]
pub enum MilkTrendError {
    /// I/O error while touching persisted state or input files
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// History log could not be serialized or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Input reading document could not be parsed
    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<MilkTrendError>,
    },
}

impl MilkTrendError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for MilkTrend operations
pub type Result<T> = std::result::Result<T, MilkTrendError>;

impl From<std::io::Error> for MilkTrendError {
    fn from(err: std::io::Error) -> Self {
        MilkTrendError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for MilkTrendError {
    fn from(err: serde_json::Error) -> Self {
        MilkTrendError::Storage(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| MilkTrendError::io(path, e))
    }
}
