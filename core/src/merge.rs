//! Shallow merging with duplicate-key detection.
//!
//! Independently loaded fragment collections are folded into a single
//! accumulator with [`safe_merge`]. Unlike a plain `extend`, a key that is
//! already present is never overwritten: the merge fails and names the key.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use field_schema_core::{SchemaError, safe_merge};
//!
//! let mut dest = BTreeMap::from([("agent".to_string(), 1)]);
//! let src = BTreeMap::from([("cloud".to_string(), 2)]);
//! safe_merge(&mut dest, src).unwrap();
//! assert_eq!(dest.len(), 2);
//!
//! let again = BTreeMap::from([("cloud".to_string(), 3)]);
//! assert_eq!(
//!     safe_merge(&mut dest, again),
//!     Err(SchemaError::DuplicateKey("cloud".into())),
//! );
//! ```

use std::collections::BTreeMap;

use crate::error::{Result, SchemaError};

/// Folds `src`'s top-level entries into `dest`.
///
/// The merge is shallow: nested values are moved as they are. Every key is
/// checked before anything is inserted, so on error `dest` is unchanged.
///
/// Returns `dest` again so several sources can be chained.
///
/// # Errors
///
/// Returns [`SchemaError::DuplicateKey`] naming the first key of `src` (in
/// sorted order) that already exists in `dest`.
pub fn safe_merge<V>(
    dest: &mut BTreeMap<String, V>,
    src: BTreeMap<String, V>,
) -> Result<&mut BTreeMap<String, V>> {
    if let Some(key) = src.keys().find(|key| dest.contains_key(*key)) {
        return Err(SchemaError::DuplicateKey(key.clone()));
    }

    dest.extend(src);
    Ok(dest)
}
