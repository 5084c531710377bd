//! Nested and flat projections of a resolved schema.
//!
//! Structural emitters consume the nested form; tabular and mapping emitters
//! consume the flat form, keyed by dotted path (`host.os.name`). Both are
//! sorted so that the same input always produces the same output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::types::{Field, FieldNode, FieldTree, ResolvedSchema};

/// Flat schema: dotted path → leaf field.
pub type FlatSchema = BTreeMap<String, Field>;

/// Both projections of one schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Hierarchical form, group name → group.
    pub nested: ResolvedSchema,
    /// Flat form, dotted path → field.
    pub flat: FlatSchema,
}

/// Projects a schema into its nested and flat forms.
///
/// Fields of a [`root`](crate::FieldGroup::root) group are keyed without the
/// group-name prefix.
///
/// # Errors
///
/// Returns [`SchemaError::DuplicateKey`] if two leaves project onto the same
/// dotted path, which can only happen when a root group shadows another
/// group's name.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use field_schema_core::*;
///
/// let group = FieldGroup::new("host").with_node("os", FieldNode::nested(None, [(
///     "name".to_string(),
///     FieldNode::Field(Field::new("name", "keyword", "OS name.")),
/// )].into()));
/// let schema = ResolvedSchema::from_groups(BTreeMap::from([("host".to_string(), group)]));
///
/// let projection = project(schema)?;
/// assert_eq!(projection.flat.keys().collect::<Vec<_>>(), vec!["host.os.name"]);
/// # Ok::<(), SchemaError>(())
/// ```
pub fn project(schema: ResolvedSchema) -> Result<Projection> {
    let mut flat = FlatSchema::new();

    for (name, group) in schema.groups() {
        let prefix = if group.root { "" } else { name.as_str() };
        flatten_into(&mut flat, prefix, &group.fields)?;
    }

    Ok(Projection {
        nested: schema,
        flat,
    })
}

fn flatten_into(flat: &mut FlatSchema, prefix: &str, tree: &FieldTree) -> Result<()> {
    for (name, node) in tree {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        match node {
            FieldNode::Field(field) => {
                if flat.contains_key(&path) {
                    return Err(SchemaError::DuplicateKey(path));
                }
                flat.insert(path, field.clone());
            }
            FieldNode::Nested(nested) => flatten_into(flat, &path, &nested.fields)?,
        }
    }
    Ok(())
}
