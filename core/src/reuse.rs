//! Reuse expansion.
//!
//! A reuse declaration asks for one group's fields to also appear at a path
//! inside another group (e.g. `geo` under `client.geo`). [`ReuseResolver`]
//! materializes every declaration into plain nested containers. Reuse chains
//! compose: if `client` reuses `source` and `source` reuses `geo`, the copy
//! of `source` spliced into `client` already contains `geo`.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::types::{FieldGroup, FieldNode, FieldTree, ResolvedSchema};

/// Expands reuse declarations over a set of pre-reuse groups.
///
/// Resolution is memoized per group and guarded by the stack of groups
/// currently being expanded, so a cyclic declaration graph is reported
/// instead of recursing forever.
pub struct ReuseResolver<'a> {
    groups: &'a BTreeMap<String, FieldGroup>,
    order: &'a [String],
    resolved: HashMap<String, FieldTree>,
    stack: Vec<String>,
}

impl<'a> ReuseResolver<'a> {
    /// Creates a resolver. `order` is the declaration order of `groups`.
    pub fn new(groups: &'a BTreeMap<String, FieldGroup>, order: &'a [String]) -> Self {
        Self {
            groups,
            order,
            resolved: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Resolves every group and assembles the top-level schema.
    ///
    /// Groups used as a reuse source stay top-level only when one of the
    /// declarations reusing them sets `contributes_to_top_level`.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::ReuseCycle`] when a chain revisits a group.
    /// - [`SchemaError::MalformedReuse`] for unknown source groups or empty
    ///   target paths.
    /// - [`SchemaError::DuplicateKey`] when a reused subtree lands on an
    ///   existing path.
    pub fn resolve_all(mut self) -> Result<ResolvedSchema> {
        for name in self.order {
            self.resolve(name)?;
        }

        let nested_only = nested_only_groups(self.groups);
        let mut out = BTreeMap::new();
        for name in self.order {
            if nested_only.contains(name.as_str()) {
                debug!(group = %name, "group only reachable through reuse");
                continue;
            }
            let Some(fields) = self.resolved.remove(name) else {
                continue;
            };
            let mut group = self.groups[name].clone();
            group.fields = fields;
            out.insert(name.clone(), group);
        }

        Ok(ResolvedSchema::from_groups(out))
    }

    /// Returns the fully expanded field tree of one group.
    pub fn resolve(&mut self, name: &str) -> Result<FieldTree> {
        if let Some(done) = self.resolved.get(name) {
            return Ok(done.clone());
        }

        if self.stack.iter().any(|active| active == name) {
            let chain = self
                .stack
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(name))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(SchemaError::ReuseCycle(chain));
        }

        let groups = self.groups;
        let group = groups.get(name).ok_or_else(|| SchemaError::MalformedReuse {
            group: self.stack.last().cloned().unwrap_or_default(),
            reason: format!("unknown source group '{name}'"),
        })?;

        self.stack.push(name.to_string());
        let result = self.expand(group);
        self.stack.pop();

        let fields = result?;
        self.resolved.insert(name.to_string(), fields.clone());
        Ok(fields)
    }

    fn expand(&mut self, group: &FieldGroup) -> Result<FieldTree> {
        let mut fields = group.fields.clone();

        for entry in group.reuse_entries() {
            let source = self.resolve(&entry.source_group)?;
            let description = self.groups[&entry.source_group].description.clone();
            debug!(
                source = %entry.source_group,
                target = %entry.target_group,
                path = %entry.target_path,
                "splicing reused fields"
            );
            insert_at(
                &mut fields,
                &entry.target_group,
                &entry.target_path,
                FieldNode::nested(description, source),
            )?;
        }

        Ok(fields)
    }
}

/// Inserts `node` at dotted `path` inside `tree`, creating containers.
fn insert_at(tree: &mut FieldTree, group: &str, path: &str, node: FieldNode) -> Result<()> {
    let malformed = || SchemaError::MalformedReuse {
        group: group.to_string(),
        reason: format!("invalid target path '{path}'"),
    };
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(malformed());
    }
    let (last, parents) = segments.split_last().ok_or_else(malformed)?;

    let mut current = tree;
    for (depth, segment) in parents.iter().enumerate() {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| FieldNode::nested(None, FieldTree::new()));
        current = match entry {
            FieldNode::Nested(nested) => &mut nested.fields,
            FieldNode::Field(_) => {
                return Err(SchemaError::DuplicateKey(format!(
                    "{group}.{}",
                    segments[..=depth].join(".")
                )));
            }
        };
    }

    if current.contains_key(*last) {
        return Err(SchemaError::DuplicateKey(format!("{group}.{path}")));
    }
    current.insert(last.to_string(), node);
    Ok(())
}

fn nested_only_groups(groups: &BTreeMap<String, FieldGroup>) -> HashSet<&str> {
    let mut sources: HashMap<&str, bool> = HashMap::new();
    for group in groups.values() {
        for decl in &group.reuse {
            let top_level = sources.entry(decl.source_group.as_str()).or_insert(false);
            *top_level |= decl.contributes_to_top_level;
        }
    }
    sources
        .into_iter()
        .filter(|(_, top_level)| !top_level)
        .map(|(name, _)| name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    fn geo() -> FieldGroup {
        let mut geo = FieldGroup::new("geo")
            .with_field("city_name", Field::new("city_name", "keyword", "City name."))
            .with_field("country_iso_code", Field::new("country_iso_code", "keyword", "ISO code."));
        geo.description = Some("Geo fields.".into());
        geo
    }

    fn resolve(groups: Vec<FieldGroup>) -> Result<ResolvedSchema> {
        let order: Vec<String> = groups.iter().map(|g| g.name.clone()).collect();
        let map: BTreeMap<String, FieldGroup> =
            groups.into_iter().map(|g| (g.name.clone(), g)).collect();
        ReuseResolver::new(&map, &order).resolve_all()
    }

    #[test]
    fn test_reuse_splices_source_fields_at_path() {
        let client = FieldGroup::new("client")
            .with_field("ip", Field::new("ip", "ip", "Client IP."))
            .with_reuse("geo", "geo", false);

        let schema = resolve(vec![client, geo()]).unwrap();
        let city = schema.lookup("client.geo.city_name").unwrap();
        assert_eq!(city.as_field().unwrap().field_type, "keyword");
        match schema.lookup("client.geo").unwrap() {
            FieldNode::Nested(nested) => {
                assert_eq!(nested.description.as_deref(), Some("Geo fields."));
            }
            FieldNode::Field(_) => panic!("expected container"),
        }
        assert!(schema.group("geo").is_none(), "geo is nested-only");
        assert_eq!(schema.group("client").unwrap().leaf_count(), 3);
    }

    #[test]
    fn test_top_level_reuse_keeps_source_group() {
        let client = FieldGroup::new("client").with_reuse("geo", "geo", true);
        let server = FieldGroup::new("server").with_reuse("geo", "geo", false);

        let schema = resolve(vec![client, server, geo()]).unwrap();
        assert!(schema.group("geo").is_some());
        assert!(schema.lookup("client.geo.city_name").is_ok());
        assert!(schema.lookup("server.geo.city_name").is_ok());
        assert_eq!(schema.leaf_count(), 6);
    }

    #[test]
    fn test_reuse_creates_intermediate_containers() {
        let threat = FieldGroup::new("threat").with_reuse("geo", "indicator.geo", false);

        let schema = resolve(vec![threat, geo()]).unwrap();
        assert!(schema.lookup("threat.indicator.geo.country_iso_code").is_ok());
    }

    #[test]
    fn test_reuse_chains_compose() {
        let source = FieldGroup::new("source")
            .with_field("ip", Field::new("ip", "ip", "Source IP."))
            .with_reuse("geo", "geo", false);
        let related = FieldGroup::new("related").with_reuse("source", "origin", false);

        let schema = resolve(vec![related, source, geo()]).unwrap();
        assert!(schema.lookup("related.origin.geo.city_name").is_ok());
        assert!(schema.lookup("related.origin.ip").is_ok());
        assert!(schema.group("source").is_none());
    }

    #[test]
    fn test_reuse_onto_existing_field_is_duplicate() {
        let client = FieldGroup::new("client")
            .with_field("geo", Field::new("geo", "geo_point", "Location."))
            .with_reuse("geo", "geo", false);

        let err = resolve(vec![client, geo()]).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateKey("client.geo".into()));
    }

    #[test]
    fn test_reuse_through_leaf_is_duplicate() {
        let client = FieldGroup::new("client")
            .with_field("location", Field::new("location", "geo_point", "Location."))
            .with_reuse("geo", "location.geo", false);

        let err = resolve(vec![client, geo()]).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateKey("client.location".into()));
    }

    #[test]
    fn test_reuse_cycle_is_configuration_error() {
        let a = FieldGroup::new("a").with_reuse("b", "b", false);
        let b = FieldGroup::new("b").with_reuse("c", "c", false);
        let c = FieldGroup::new("c").with_reuse("a", "a", false);

        let err = resolve(vec![a, b, c]).unwrap_err();
        assert_eq!(err, SchemaError::ReuseCycle("a -> b -> c -> a".into()));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_self_reuse_is_cycle() {
        let a = FieldGroup::new("a").with_reuse("a", "self", false);
        let err = resolve(vec![a]).unwrap_err();
        assert_eq!(err, SchemaError::ReuseCycle("a -> a".into()));
    }

    #[test]
    fn test_unknown_source_group_is_malformed() {
        let client = FieldGroup::new("client").with_reuse("nope", "nope", false);
        let err = resolve(vec![client]).unwrap_err();
        assert!(matches!(err, SchemaError::MalformedReuse { ref group, .. } if group == "client"));
    }

    #[test]
    fn test_empty_target_segment_is_malformed() {
        let client = FieldGroup::new("client").with_reuse("geo", "a..b", false);
        let err = resolve(vec![client, geo()]).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_aliased_copies_are_independent() {
        let client = FieldGroup::new("client").with_reuse("geo", "geo", true);
        let schema = resolve(vec![client, geo()]).unwrap();
        let mut groups = schema.into_groups();

        groups.get_mut("geo").unwrap().fields.clear();
        assert_eq!(groups["client"].leaf_count(), 2);
    }
}
