//! Error handling for the bedside service
//!
//! This module provides structured error types covering the modeling
//! pipeline, persistence, and dataset handling.

use thiserror::Error;

/// Main error type for the bedside service
///
/// Per-request failures (shape mismatches on the inference path) never take
/// the process down; startup failures (corrupt model, missing dataset) abort
/// before the listener binds.
#[derive(Error, Debug)]
pub enum BedsideError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Corrupt model file {path}: {reason}")]
    CorruptModel { path: String, reason: String },

    #[error("Dataset not found: {path}")]
    DatasetNotFound { path: String },

    #[error("Malformed dataset row {row}: {reason}")]
    DatasetRow { row: usize, reason: String },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Type alias for Result with BedsideError
pub type BedsideResult<T> = Result<T, BedsideError>;

impl BedsideError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch { expected, actual }
    }

    /// Create a corrupt model error
    pub fn corrupt_model(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptModel {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a dataset-not-found error
    pub fn dataset_not_found(path: impl Into<String>) -> Self {
        Self::DatasetNotFound { path: path.into() }
    }

    /// Create a malformed-row error (row numbers are 1-based)
    pub fn dataset_row(row: usize, reason: impl Into<String>) -> Self {
        Self::DatasetRow {
            row,
            reason: reason.into(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
