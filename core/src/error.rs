//! Error types for schema assembly, subsetting, and lookup.

use thiserror::Error;

/// Errors raised by the schema pipeline.
///
/// Every variant is fatal for the run that produced it; there is no partial
/// output mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two sources claim the same key or path.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A reuse chain revisits a group that is still being expanded.
    #[error("reuse cycle detected: {0}")]
    ReuseCycle(String),

    /// A reuse declaration cannot be honored as written.
    #[error("malformed reuse in group '{group}': {reason}")]
    MalformedReuse { group: String, reason: String },

    /// A subset was requested but selected nothing.
    #[error("subset matched no fields")]
    EmptySubset,

    /// A dotted path does not resolve inside the tree.
    #[error("path not found: {0}")]
    NotFound(String),
}

impl SchemaError {
    /// Returns `true` for errors caused by inconsistent reuse declarations.
    ///
    /// # Examples
    ///
    /// ```
    /// use field_schema_core::SchemaError;
    ///
    /// assert!(SchemaError::ReuseCycle("a -> b -> a".into()).is_configuration_error());
    /// assert!(!SchemaError::EmptySubset.is_configuration_error());
    /// ```
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::ReuseCycle(_) | Self::MalformedReuse { .. })
    }
}

/// Convenience alias for results with [`SchemaError`].
pub type Result<T> = std::result::Result<T, SchemaError>;
