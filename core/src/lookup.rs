//! Random access into nested field trees by dotted path.

use crate::error::{Result, SchemaError};
use crate::types::{FieldNode, FieldTree, ResolvedSchema};

/// Walks `path` one segment at a time through `tree`.
///
/// # Errors
///
/// Returns [`SchemaError::NotFound`] with the full path if any segment is
/// missing, or if the walk would have to descend into a leaf field.
///
/// # Examples
///
/// ```
/// use field_schema_core::{Field, FieldGroup, FieldNode, get_nested};
///
/// let group = FieldGroup::new("host").with_node(
///     "os",
///     FieldNode::nested(None, [(
///         "name".to_string(),
///         FieldNode::Field(Field::new("name", "keyword", "Operating system name.")),
///     )].into()),
/// );
///
/// let node = get_nested("os.name", &group.fields).unwrap();
/// assert_eq!(node.as_field().unwrap().name, "name");
/// assert!(get_nested("os.version", &group.fields).is_err());
/// ```
pub fn get_nested<'a>(path: &str, tree: &'a FieldTree) -> Result<&'a FieldNode> {
    let not_found = || SchemaError::NotFound(path.to_string());

    let mut segments = path.split('.');
    let first = segments.next().filter(|s| !s.is_empty()).ok_or_else(not_found)?;
    let mut node = tree.get(first).ok_or_else(not_found)?;

    for segment in segments {
        node = node
            .children()
            .and_then(|children| children.get(segment))
            .ok_or_else(not_found)?;
    }

    Ok(node)
}

impl ResolvedSchema {
    /// Resolves a dotted path whose first segment names a top-level group.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NotFound`] if the group or any later segment is
    /// absent. A bare group name is not a field path and is also reported as
    /// not found; use [`group`](ResolvedSchema::group) for that.
    pub fn lookup(&self, path: &str) -> Result<&FieldNode> {
        let (group_name, rest) = path
            .split_once('.')
            .ok_or_else(|| SchemaError::NotFound(path.to_string()))?;
        let group = self
            .group(group_name)
            .ok_or_else(|| SchemaError::NotFound(path.to_string()))?;

        get_nested(rest, &group.fields).map_err(|_| SchemaError::NotFound(path.to_string()))
    }
}
