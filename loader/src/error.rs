//! Error types for fragment loading and artifact writing.
//!
//! Provides a unified error type covering all failure modes: I/O,
//! serialization, malformed documents, and the schema errors raised while
//! assembling what was loaded.

use std::path::PathBuf;

use field_schema_core::SchemaError;
use thiserror::Error;

/// Errors that can occur while loading inputs or writing outputs.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A document could not be parsed as a fragment or subset declaration.
    #[error("invalid document '{path}': {reason}")]
    InvalidDocument { path: PathBuf, reason: String },

    /// Merging, reuse expansion, subsetting or projection failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// No fragment source was configured.
    #[error("no fragment sources configured")]
    NoSources,

    /// The manifest checksum does not match the projection it describes.
    #[error("invalid checksum: expected {expected}, got {actual}")]
    InvalidChecksum { expected: String, actual: String },
}

/// Convenience alias for results with [`LoaderError`].
pub type Result<T> = std::result::Result<T, LoaderError>;
