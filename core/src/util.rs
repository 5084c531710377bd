//! Small list helpers used by listings and emitters.

use crate::types::{FieldGroup, ResolvedSchema};

/// Splits `items` into consecutive chunks of at most `size` elements.
///
/// Concatenating the chunks reproduces `items` in order. A `size` of zero is
/// treated as one.
///
/// # Examples
///
/// ```
/// use field_schema_core::split_by;
///
/// let chunks = split_by(&["ecs", "has", "a", "meme", "now"], 3);
/// assert_eq!(chunks, vec![vec!["ecs", "has", "a"], vec!["meme", "now"]]);
/// ```
pub fn split_by<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}

/// Returns the schema's groups ordered by `(group priority, name)`.
///
/// Groups without a priority sort after every prioritized group.
pub fn sorted_by_priority(schema: &ResolvedSchema) -> Vec<&FieldGroup> {
    let mut groups: Vec<&FieldGroup> = schema.groups().values().collect();
    groups.sort_by(|a, b| {
        let key_a = (a.group.unwrap_or(u32::MAX), &a.name);
        let key_b = (b.group.unwrap_or(u32::MAX), &b.name);
        key_a.cmp(&key_b)
    });
    groups
}
