// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Reverie memory engine.

use thiserror::Error;

/// The primary error type used across the store, index, and retrieval layers.
#[derive(Debug, Error)]
pub enum ReverieError {
    /// Configuration errors (invalid TOML, out-of-range values, dimension
    /// conflicts with an existing database).
    #[error("configuration error: {0}")]
    Config(String),

    /// A caller-supplied vector does not match the store dimension. The
    /// offending operation leaves no partial state behind.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The targeted record does not exist.
    #[error("record not found: {id}")]
    NotFound { id: String },

    /// Storage backend errors (database connection, query failure,
    /// serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A search could not be completed; no partial result set is returned.
    #[error("search failed: {message}")]
    SearchFailed { message: String },

    /// The backing database could not be opened or prepared.
    #[error("failed to open store at {path}: {source}")]
    PersistenceOpen {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Embedding provider errors (model failure, empty input, transport).
    #[error("embedding error: {message}")]
    Embedding { message: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
