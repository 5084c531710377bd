//! Schema assembly from independently loaded fragment sources.
//!
//! [`SchemaAssembler`] owns the accumulator for exactly one run: sources are
//! folded in with [`safe_merge`](crate::safe_merge), then
//! [`resolve`](SchemaAssembler::resolve) consumes the assembler and expands
//! every reuse declaration.
//!
//! # Example
//!
//! ```
//! use field_schema_core::{Field, FieldGroup, SchemaAssembler};
//!
//! let mut assembler = SchemaAssembler::new();
//! assembler
//!     .add_group(FieldGroup::new("geo")
//!         .with_field("city_name", Field::new("city_name", "keyword", "City.")))?
//!     .add_group(FieldGroup::new("client").with_reuse("geo", "geo", false))?;
//!
//! let schema = assembler.resolve()?;
//! assert!(schema.lookup("client.geo.city_name").is_ok());
//! # Ok::<(), field_schema_core::SchemaError>(())
//! ```

use std::collections::BTreeMap;

use tracing::info;

use crate::error::Result;
use crate::merge::safe_merge;
use crate::reuse::ReuseResolver;
use crate::types::{FieldGroup, ResolvedSchema};

/// Owned accumulator of pre-reuse groups for a single assembly run.
#[derive(Debug, Default)]
pub struct SchemaAssembler {
    groups: BTreeMap<String, FieldGroup>,
    order: Vec<String>,
}

impl SchemaAssembler {
    /// Creates an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one source's groups into the accumulator.
    ///
    /// Groups keep the order in which they are added; within one source they
    /// are taken in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateKey`](crate::SchemaError::DuplicateKey)
    /// if a group name is already present, either from an earlier source or
    /// twice within `groups`. Nothing is added on error.
    pub fn add_source(
        &mut self,
        groups: impl IntoIterator<Item = FieldGroup>,
    ) -> Result<&mut Self> {
        let mut batch = BTreeMap::new();
        let mut names = Vec::new();
        for group in groups {
            let name = group.name.clone();
            safe_merge(&mut batch, BTreeMap::from([(name.clone(), group)]))?;
            names.push(name);
        }

        safe_merge(&mut self.groups, batch)?;
        self.order.extend(names);
        Ok(self)
    }

    /// Merges a single group into the accumulator.
    pub fn add_group(&mut self, group: FieldGroup) -> Result<&mut Self> {
        self.add_source([group])
    }

    /// Returns the number of accumulated groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if nothing has been added yet.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Expands all reuse declarations and returns the resolved schema.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`ReuseResolver::resolve_all`].
    pub fn resolve(self) -> Result<ResolvedSchema> {
        let schema = ReuseResolver::new(&self.groups, &self.order).resolve_all()?;
        info!(
            groups = schema.len(),
            fields = schema.leaf_count(),
            "resolved schema"
        );
        Ok(schema)
    }
}
