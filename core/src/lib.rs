//! Field-schema resolution engine.
//!
//! This crate turns independently loaded field-group fragments into a single
//! resolved schema and projects it for artifact generation:
//!
//! - [`FieldGroup`]: a named tree of [`Field`] leaves and nested
//!   containers, plus reuse declarations.
//! - [`SchemaAssembler`]: owned accumulator that merges fragment sources
//!   with [`safe_merge`] (duplicate group names are fatal) and expands reuse
//!   through [`ReuseResolver`].
//! - [`SubsetSpec`]: a caller-declared selection, unioned with
//!   [`merge_subset`] and applied with [`apply_subset`].
//! - [`project`]: nested and flat ([`FlatSchema`]) forms of the schema.
//!
//! Direct access into a tree goes through [`get_nested`] or
//! [`ResolvedSchema::lookup`].
//!
//! # Example
//!
//! ```
//! use field_schema_core::*;
//!
//! let mut assembler = SchemaAssembler::new();
//! assembler.add_source([
//!     FieldGroup::new("geo")
//!         .with_field("city_name", Field::new("city_name", "keyword", "City name.")),
//!     FieldGroup::new("client")
//!         .with_field("ip", Field::new("ip", "ip", "Client IP address."))
//!         .with_reuse("geo", "geo", false),
//! ])?;
//! let schema = assembler.resolve()?;
//!
//! let spec = SubsetSpec::new().with("client", SubsetNode::children([
//!     ("geo", SubsetNode::Wildcard),
//! ]));
//! let projection = project(apply_subset(&spec, &schema)?)?;
//!
//! assert_eq!(projection.flat.keys().collect::<Vec<_>>(), vec!["client.geo.city_name"]);
//! # Ok::<(), SchemaError>(())
//! ```

mod assemble;
mod error;
mod lookup;
mod merge;
mod project;
mod reuse;
mod subset;
mod types;
mod util;

pub use assemble::SchemaAssembler;
pub use error::{Result, SchemaError};
pub use lookup::get_nested;
pub use merge::safe_merge;
pub use project::{FlatSchema, Projection, project};
pub use reuse::ReuseResolver;
pub use subset::{SubsetNode, SubsetSpec, apply_subset, merge_subset};
pub use types::*;
pub use util::{sorted_by_priority, split_by};
