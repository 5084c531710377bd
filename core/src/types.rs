//! Field and field-group type definitions.
//!
//! This module defines the data model shared by every stage of the
//! pipeline. The types are designed for serialization with [`serde`] and
//! round-trip through the YAML fragment documents as well as the JSON and
//! YAML intermediate files.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Nested field tree keyed by field name.
///
/// Iteration is sorted, which is what makes projection deterministic.
/// Documents are read through [`deserialize_field_tree`], which rejects a
/// name declared twice under the same parent.
pub type FieldTree = BTreeMap<String, FieldNode>;

/// Reads a [`FieldTree`] from a mapping.
///
/// A sibling name that appears twice is an error rather than last-wins, and
/// a leaf without an explicit `name` takes its mapping key.
///
/// # Examples
///
/// ```
/// use field_schema_core::FieldGroup;
///
/// let group: FieldGroup = serde_json::from_str(
///     r#"{"name": "agent", "fields": {"id": {"type": "keyword"}}}"#,
/// ).unwrap();
/// assert_eq!(group.fields["id"].as_field().unwrap().name, "id");
///
/// let repeated = r#"{"name": "agent", "fields": {"id": {"type": "keyword"}, "id": {"type": "long"}}}"#;
/// assert!(serde_json::from_str::<FieldGroup>(repeated).is_err());
/// ```
pub fn deserialize_field_tree<'de, D>(deserializer: D) -> Result<FieldTree, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(FieldTreeVisitor)
}

struct FieldTreeVisitor;

impl<'de> Visitor<'de> for FieldTreeVisitor {
    type Value = FieldTree;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a mapping of field names to fields")
    }

    fn visit_map<A>(self, mut map: A) -> Result<FieldTree, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut tree = FieldTree::new();
        while let Some((name, mut node)) = map.next_entry::<String, FieldNode>()? {
            if let FieldNode::Field(field) = &mut node {
                if field.name.is_empty() {
                    field.name = name.clone();
                }
            }
            match tree.entry(name) {
                Entry::Occupied(existing) => {
                    return Err(de::Error::custom(format!(
                        "duplicate field name: {}",
                        existing.key()
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(node);
                }
            }
        }
        Ok(tree)
    }
}

/// A leaf field definition.
///
/// Besides `name`, `type` and `description`, a field keeps any auxiliary
/// attributes (examples, normalization hints, levels) verbatim in
/// [`extra`](Field::extra).
///
/// # Examples
///
/// ```
/// use field_schema_core::Field;
///
/// let field = Field::new("id", "keyword", "The cloud account ID.")
///     .with_attribute("example", "666777888999");
/// assert_eq!(field.field_type, "keyword");
/// assert_eq!(field.attribute("example").and_then(|v| v.as_str()), Some("666777888999"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Leaf name (the last segment of the dotted path). Filled from the
    /// mapping key when a document leaves it out.
    #[serde(default)]
    pub name: String,
    /// Datatype of the field (e.g. `keyword`, `date`, `long`).
    #[serde(rename = "type")]
    pub field_type: String,
    /// Human readable description.
    #[serde(default)]
    pub description: String,
    /// Auxiliary metadata carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Field {
    /// Creates a field with no auxiliary metadata.
    pub fn new(name: &str, field_type: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            description: description.to_string(),
            extra: BTreeMap::new(),
        }
    }

    /// Adds an auxiliary attribute.
    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Returns an auxiliary attribute by key.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// A container of nested fields inside a group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NestedFields {
    /// Optional description of the container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Child nodes.
    #[serde(deserialize_with = "deserialize_field_tree")]
    pub fields: FieldTree,
}

/// A node of the field tree: either a leaf [`Field`] or a container.
///
/// Documents distinguish the two by shape: a mapping with a `fields` key is
/// a container, anything else must describe a leaf and carry a `type`.
///
/// # Examples
///
/// ```
/// use field_schema_core::FieldNode;
///
/// let leaf: FieldNode = serde_json::from_str(r#"{"type": "keyword"}"#).unwrap();
/// assert!(leaf.as_field().is_some());
///
/// let nested: FieldNode = serde_json::from_str(
///     r#"{"fields": {"id": {"type": "keyword"}}}"#,
/// ).unwrap();
/// assert_eq!(nested.children().map(|c| c.len()), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldNode {
    /// Container of nested fields.
    Nested(NestedFields),
    /// Leaf field.
    Field(Field),
}

impl FieldNode {
    /// Wraps a field tree in a container node.
    pub fn nested(description: Option<String>, fields: FieldTree) -> Self {
        Self::Nested(NestedFields {
            description,
            fields,
        })
    }

    /// Returns the leaf field, if this node is one.
    pub fn as_field(&self) -> Option<&Field> {
        match self {
            Self::Field(field) => Some(field),
            Self::Nested(_) => None,
        }
    }

    /// Returns the child nodes, if this node is a container.
    pub fn children(&self) -> Option<&FieldTree> {
        match self {
            Self::Nested(nested) => Some(&nested.fields),
            Self::Field(_) => None,
        }
    }

    /// Counts the leaf fields reachable from this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Field(_) => 1,
            Self::Nested(nested) => count_leaves(&nested.fields),
        }
    }
}

/// Counts the leaf fields in a tree.
pub fn count_leaves(tree: &FieldTree) -> usize {
    tree.values().map(FieldNode::leaf_count).sum()
}

/// A reuse declaration as written in a fragment document.
///
/// The declaring group is the target; see [`ReuseEntry`] for the resolved
/// form that names both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReuseDeclaration {
    /// Group whose fields are spliced in.
    pub source_group: String,
    /// Dotted path inside the declaring group where the fields land.
    pub target_path: String,
    /// Keep the source group reachable as a standalone top-level group.
    #[serde(default)]
    pub contributes_to_top_level: bool,
}

/// A fully qualified reuse relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReuseEntry {
    pub source_group: String,
    pub target_group: String,
    pub target_path: String,
    pub contributes_to_top_level: bool,
}

/// A named group of fields, as declared by one fragment.
///
/// # Examples
///
/// ```
/// use field_schema_core::{Field, FieldGroup};
///
/// let group = FieldGroup::new("cloud")
///     .with_field("provider", Field::new("provider", "keyword", "Cloud provider."))
///     .with_reuse("geo", "geo", false);
///
/// assert_eq!(group.fields.len(), 1);
/// let entries: Vec<_> = group.reuse_entries().collect();
/// assert_eq!(entries[0].target_group, "cloud");
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldGroup {
    /// Group name, also the top-level key and the flat-path prefix.
    pub name: String,
    /// Display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Group description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordering priority used by listings; lower sorts first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<u32>,
    /// Root groups contribute their fields without a name prefix.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub root: bool,
    /// Field tree.
    #[serde(default, deserialize_with = "deserialize_field_tree")]
    pub fields: FieldTree,
    /// Reuse declarations targeting this group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reuse: Vec<ReuseDeclaration>,
}

impl FieldGroup {
    /// Creates an empty group.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Adds a leaf field under `key`.
    pub fn with_field(mut self, key: &str, field: Field) -> Self {
        self.fields.insert(key.to_string(), FieldNode::Field(field));
        self
    }

    /// Adds a nested node under `key`.
    pub fn with_node(mut self, key: &str, node: FieldNode) -> Self {
        self.fields.insert(key.to_string(), node);
        self
    }

    /// Declares that `source_group` is reused at `target_path` in this group.
    pub fn with_reuse(mut self, source_group: &str, target_path: &str, top_level: bool) -> Self {
        self.reuse.push(ReuseDeclaration {
            source_group: source_group.to_string(),
            target_path: target_path.to_string(),
            contributes_to_top_level: top_level,
        });
        self
    }

    /// Returns the reuse declarations qualified with this group as target.
    pub fn reuse_entries(&self) -> impl Iterator<Item = ReuseEntry> + '_ {
        self.reuse.iter().map(|decl| ReuseEntry {
            source_group: decl.source_group.clone(),
            target_group: self.name.clone(),
            target_path: decl.target_path.clone(),
            contributes_to_top_level: decl.contributes_to_top_level,
        })
    }

    /// Counts the leaf fields in this group.
    pub fn leaf_count(&self) -> usize {
        count_leaves(&self.fields)
    }
}

/// Fully reuse-expanded schema keyed by top-level group name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedSchema {
    groups: BTreeMap<String, FieldGroup>,
}

impl ResolvedSchema {
    /// Wraps an already resolved group map.
    pub fn from_groups(groups: BTreeMap<String, FieldGroup>) -> Self {
        Self { groups }
    }

    /// Looks up a top-level group.
    pub fn group(&self, name: &str) -> Option<&FieldGroup> {
        self.groups.get(name)
    }

    /// Returns the underlying group map.
    pub fn groups(&self) -> &BTreeMap<String, FieldGroup> {
        &self.groups
    }

    /// Consumes the schema, returning the group map.
    pub fn into_groups(self) -> BTreeMap<String, FieldGroup> {
        self.groups
    }

    /// Returns an iterator over top-level group names in sorted order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Returns the number of top-level groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if the schema has no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Counts every leaf field in the schema.
    pub fn leaf_count(&self) -> usize {
        self.groups.values().map(FieldGroup::leaf_count).sum()
    }
}
