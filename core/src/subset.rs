//! Subset declarations and schema pruning.
//!
//! A subset declaration selects part of a resolved schema. Each selected
//! name maps either to the wildcard (keep the whole subtree) or to a nested
//! selection of children:
//!
//! ```yaml
//! cloud:
//!   fields: '*'
//! host:
//!   fields:
//!     os:
//!       fields:
//!         name: {}
//! ```
//!
//! `{fields: '*'}` and `{}` both mean wildcard. Several declarations are
//! unioned with [`merge_subset`] before being applied with [`apply_subset`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::types::{FieldGroup, FieldNode, FieldTree, NestedFields, ResolvedSchema};

const WILDCARD: &str = "*";

/// One node of a subset declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSubsetNode", into = "RawSubsetNode")]
pub enum SubsetNode {
    /// Include the subtree entirely.
    Wildcard,
    /// Include only the named children, each filtered recursively.
    Children(BTreeMap<String, SubsetNode>),
}

/// A subset declaration: top-level group name → selection.
///
/// # Examples
///
/// ```
/// use field_schema_core::{SubsetNode, SubsetSpec};
///
/// let spec: SubsetSpec = serde_yaml::from_str("cloud:\n  fields: '*'\nhost: {}\n").unwrap();
/// assert_eq!(spec.get("cloud"), Some(&SubsetNode::Wildcard));
/// assert_eq!(spec.get("host"), Some(&SubsetNode::Wildcard));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubsetSpec(BTreeMap<String, SubsetNode>);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSubsetNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fields: Option<RawSelector>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawSelector {
    All(String),
    Children(BTreeMap<String, RawSubsetNode>),
}

impl TryFrom<RawSubsetNode> for SubsetNode {
    type Error = String;

    fn try_from(raw: RawSubsetNode) -> std::result::Result<Self, Self::Error> {
        match raw.fields {
            None => Ok(Self::Wildcard),
            Some(RawSelector::All(marker)) if marker == WILDCARD => Ok(Self::Wildcard),
            Some(RawSelector::All(other)) => Err(format!(
                "unsupported subset selector '{other}', expected '{WILDCARD}' or a mapping"
            )),
            Some(RawSelector::Children(children)) => children
                .into_iter()
                .map(|(name, node)| Self::try_from(node).map(|node| (name, node)))
                .collect::<std::result::Result<BTreeMap<_, _>, _>>()
                .map(Self::Children),
        }
    }
}

impl From<SubsetNode> for RawSubsetNode {
    fn from(node: SubsetNode) -> Self {
        let fields = match node {
            SubsetNode::Wildcard => RawSelector::All(WILDCARD.to_string()),
            SubsetNode::Children(children) => RawSelector::Children(
                children
                    .into_iter()
                    .map(|(name, child)| (name, Self::from(child)))
                    .collect(),
            ),
        };
        Self {
            fields: Some(fields),
        }
    }
}

impl SubsetNode {
    /// Builds a children node from `(name, node)` pairs.
    pub fn children<'a>(entries: impl IntoIterator<Item = (&'a str, SubsetNode)>) -> Self {
        Self::Children(
            entries
                .into_iter()
                .map(|(name, node)| (name.to_string(), node))
                .collect(),
        )
    }

    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Wildcard, _) | (_, Self::Wildcard) => Self::Wildcard,
            (Self::Children(mut left), Self::Children(right)) => {
                merge_children(&mut left, right);
                Self::Children(left)
            }
        }
    }
}

fn merge_children(dest: &mut BTreeMap<String, SubsetNode>, src: BTreeMap<String, SubsetNode>) {
    for (name, node) in src {
        let merged = match dest.remove(&name) {
            Some(existing) => existing.merge(node),
            None => node,
        };
        dest.insert(name, merged);
    }
}

impl SubsetSpec {
    /// Creates an empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the selection for a top-level name.
    pub fn with(mut self, name: &str, node: SubsetNode) -> Self {
        self.0.insert(name.to_string(), node);
        self
    }

    /// Returns the selection for a top-level name.
    pub fn get(&self, name: &str) -> Option<&SubsetNode> {
        self.0.get(name)
    }

    /// Returns `true` if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Folds `other` into this declaration in place.
    pub fn merge_from(&mut self, other: SubsetSpec) {
        merge_children(&mut self.0, other.0);
    }
}

/// Unions two subset declarations.
///
/// Key by key: a wildcard on either side wins, two nested selections merge
/// recursively over the union of their children, and a key present on one
/// side only passes through. The operation is idempotent and commutative.
///
/// # Examples
///
/// ```
/// use field_schema_core::{SubsetNode, SubsetSpec, merge_subset};
///
/// let specific = SubsetSpec::new().with("host", SubsetNode::children([
///     ("os", SubsetNode::children([("name", SubsetNode::Wildcard)])),
/// ]));
/// let everything = SubsetSpec::new().with("host", SubsetNode::Wildcard);
///
/// let merged = merge_subset(specific.clone(), everything);
/// assert_eq!(merged.get("host"), Some(&SubsetNode::Wildcard));
/// assert_eq!(merge_subset(specific.clone(), specific.clone()), specific);
/// ```
pub fn merge_subset(mut a: SubsetSpec, b: SubsetSpec) -> SubsetSpec {
    a.merge_from(b);
    a
}

/// Prunes `schema` down to the selection described by `spec`.
///
/// Selected names missing from the schema are ignored. Groups and
/// containers left without children are dropped, and a nested selection
/// aimed at a leaf field matches nothing. Surviving fields are copied
/// unmodified.
///
/// # Errors
///
/// Returns [`SchemaError::EmptySubset`] if nothing survives.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use field_schema_core::*;
///
/// let group = FieldGroup::new("g")
///     .with_field("f1", Field::new("f1", "keyword", "kept"))
///     .with_field("f2", Field::new("f2", "keyword", "dropped"));
/// let schema = ResolvedSchema::from_groups(BTreeMap::from([("g".to_string(), group)]));
///
/// let spec = SubsetSpec::new().with("g", SubsetNode::children([("f1", SubsetNode::Wildcard)]));
/// let pruned = apply_subset(&spec, &schema).unwrap();
/// assert!(pruned.lookup("g.f1").is_ok());
/// assert!(pruned.lookup("g.f2").is_err());
/// ```
pub fn apply_subset(spec: &SubsetSpec, schema: &ResolvedSchema) -> Result<ResolvedSchema> {
    let mut retained = BTreeMap::new();

    for (name, node) in &spec.0 {
        let Some(group) = schema.group(name) else {
            debug!(group = %name, "subset names a group absent from the schema");
            continue;
        };
        let kept = match node {
            SubsetNode::Wildcard => Some(group.clone()),
            SubsetNode::Children(children) => {
                let fields = filter_tree(children, &group.fields, name);
                (!fields.is_empty()).then(|| FieldGroup {
                    fields,
                    ..group.clone()
                })
            }
        };
        if let Some(group) = kept {
            retained.insert(name.clone(), group);
        }
    }

    if retained.is_empty() {
        return Err(SchemaError::EmptySubset);
    }
    Ok(ResolvedSchema::from_groups(retained))
}

fn filter_tree(selection: &BTreeMap<String, SubsetNode>, tree: &FieldTree, path: &str) -> FieldTree {
    let mut retained = FieldTree::new();

    for (name, node) in selection {
        let Some(field) = tree.get(name) else {
            debug!(path = %format!("{path}.{name}"), "subset names a field absent from the schema");
            continue;
        };
        let kept = match (node, field) {
            (SubsetNode::Wildcard, _) => Some(field.clone()),
            (SubsetNode::Children(children), FieldNode::Nested(nested)) => {
                let fields = filter_tree(children, &nested.fields, &format!("{path}.{name}"));
                (!fields.is_empty()).then(|| {
                    FieldNode::Nested(NestedFields {
                        description: nested.description.clone(),
                        fields,
                    })
                })
            }
            (SubsetNode::Children(_), FieldNode::Field(_)) => None,
        };
        if let Some(node) = kept {
            retained.insert(name.clone(), node);
        }
    }

    retained
}
