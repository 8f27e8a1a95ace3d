// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths, parameter lower bounds, and
//! threshold ranges.

use thiserror::Error;

use crate::model::ReverieConfig;

/// A configuration error surfaced during loading or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML/env input could not be deserialized into the model.
    #[error("configuration parse error: {0}")]
    Parse(String),

    /// A validation error for a config value.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ReverieConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate database_path is not empty
    if config.store.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "store.database_path must not be empty".to_string(),
        });
    }

    // Validate dimension is positive
    if config.store.dimension == 0 {
        errors.push(ConfigError::Validation {
            message: "store.dimension must be at least 1".to_string(),
        });
    }

    // Validate HNSW parameters. m >= 2 because the layer distribution
    // divides by ln(m).
    if config.index.hnsw.m < 2 {
        errors.push(ConfigError::Validation {
            message: format!("index.hnsw.m must be at least 2, got {}", config.index.hnsw.m),
        });
    }

    if config.index.hnsw.ef_construction == 0 {
        errors.push(ConfigError::Validation {
            message: "index.hnsw.ef_construction must be at least 1".to_string(),
        });
    }

    if config.index.hnsw.ef_search == 0 {
        errors.push(ConfigError::Validation {
            message: "index.hnsw.ef_search must be at least 1".to_string(),
        });
    }

    // Validate IVF parameters
    if config.index.ivf.n_clusters == 0 {
        errors.push(ConfigError::Validation {
            message: "index.ivf.n_clusters must be at least 1".to_string(),
        });
    }

    if config.index.ivf.n_probe == 0 {
        errors.push(ConfigError::Validation {
            message: "index.ivf.n_probe must be at least 1".to_string(),
        });
    }

    if config.index.ivf.n_probe > config.index.ivf.n_clusters {
        errors.push(ConfigError::Validation {
            message: format!(
                "index.ivf.n_probe ({}) must not exceed index.ivf.n_clusters ({})",
                config.index.ivf.n_probe, config.index.ivf.n_clusters
            ),
        });
    }

    // Validate LSH parameters. Codes are stored as u32 bit patterns.
    if config.index.lsh.n_tables == 0 {
        errors.push(ConfigError::Validation {
            message: "index.lsh.n_tables must be at least 1".to_string(),
        });
    }

    if config.index.lsh.n_bits == 0 || config.index.lsh.n_bits > 32 {
        errors.push(ConfigError::Validation {
            message: format!(
                "index.lsh.n_bits must be between 1 and 32, got {}",
                config.index.lsh.n_bits
            ),
        });
    }

    // Validate retrieval parameters
    if !(0.0..=1.0).contains(&config.retrieval.retrieval_threshold) {
        errors.push(ConfigError::Validation {
            message: format!(
                "retrieval.retrieval_threshold must be within 0.0-1.0, got {}",
                config.retrieval.retrieval_threshold
            ),
        });
    }

    if config.retrieval.semantic_candidates == 0 {
        errors.push(ConfigError::Validation {
            message: "retrieval.semantic_candidates must be at least 1".to_string(),
        });
    }

    if config.retrieval.location_radius_m <= 0.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "retrieval.location_radius_m must be positive, got {}",
                config.retrieval.location_radius_m
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
