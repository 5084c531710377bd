//! Generation manifest.
//!
//! The manifest records what a generation run produced: the schema version,
//! how many groups and fields were projected, whether a subset was applied,
//! and a SHA-256 checksum of the flat schema. Two runs over the same inputs
//! produce the same checksum because the flat schema is serialized in sorted
//! order.
//!
//! # Examples
//!
//! ```no_run
//! use field_schema_core::{ResolvedSchema, project};
//! use field_schema_loader::GenerationManifest;
//!
//! let projection = project(ResolvedSchema::default()).unwrap();
//! let manifest = GenerationManifest::new("8.11.0", &projection, false).unwrap();
//!
//! manifest.save("manifest.json").unwrap();
//! let loaded = GenerationManifest::load("manifest.json").unwrap();
//! loaded.verify(&projection).unwrap();
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use field_schema_core::{FlatSchema, Projection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{LoaderError, Result};

/// File name of the manifest inside the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Summary of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationManifest {
    /// Schema version string the artifacts were generated for.
    pub version: String,
    /// Version of the generator that produced this manifest.
    pub tool_version: String,
    /// RFC 3339 timestamp of the run.
    pub generated_at: String,
    /// Number of top-level groups in the nested output.
    pub group_count: usize,
    /// Number of leaf fields in the flat output.
    pub field_count: usize,
    /// Whether the outputs were restricted to a subset.
    pub subset_applied: bool,
    /// SHA-256 hex digest of the flat schema's canonical JSON.
    pub checksum: String,
}

impl GenerationManifest {
    /// Describes `projection` as generated now.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError`](crate::LoaderError::JsonError) if the flat schema
    /// cannot be serialized for checksumming.
    pub fn new(version: &str, projection: &Projection, subset_applied: bool) -> Result<Self> {
        Ok(Self {
            version: version.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            group_count: projection.nested.len(),
            field_count: projection.flat.len(),
            subset_applied,
            checksum: Self::calculate_checksum(&projection.flat)?,
        })
    }

    /// Loads a manifest from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot
    /// be read, or [`JsonError`](crate::LoaderError::JsonError) if the
    /// content is not valid manifest JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let manifest = serde_json::from_reader(reader)?;
        Ok(manifest)
    }

    /// Saves the manifest as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot
    /// be written, or [`JsonError`](crate::LoaderError::JsonError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Computes the SHA-256 hex digest of a flat schema.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError`](crate::LoaderError::JsonError) if serialization
    /// fails.
    pub fn calculate_checksum(flat: &FlatSchema) -> Result<String> {
        let bytes = serde_json::to_vec(flat)?;
        let hash = Sha256::digest(&bytes);
        Ok(format!("{:x}", hash))
    }

    /// Checks that `projection` is the one this manifest describes.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidChecksum`] on mismatch.
    pub fn verify(&self, projection: &Projection) -> Result<()> {
        let actual = Self::calculate_checksum(&projection.flat)?;
        if actual != self.checksum {
            return Err(LoaderError::InvalidChecksum {
                expected: self.checksum.clone(),
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use field_schema_core::{Field, FieldGroup, ResolvedSchema, project};

    use super::*;

    fn projection(description: &str) -> Projection {
        let group = FieldGroup::new("agent")
            .with_field("id", Field::new("id", "keyword", description))
            .with_field("name", Field::new("name", "keyword", "Agent name."));
        project(ResolvedSchema::from_groups(BTreeMap::from([(
            "agent".to_string(),
            group,
        )])))
        .unwrap()
    }

    #[test]
    fn test_manifest_creation() {
        let manifest = GenerationManifest::new("8.11.0", &projection("Agent ID."), true).unwrap();
        assert_eq!(manifest.version, "8.11.0");
        assert_eq!(manifest.group_count, 1);
        assert_eq!(manifest.field_count, 2);
        assert!(manifest.subset_applied);
        assert_eq!(manifest.checksum.len(), 64);
        assert!(manifest.generated_at.ends_with('Z'));
    }

    #[test]
    fn test_checksum_is_stable_and_content_sensitive() {
        let a = GenerationManifest::calculate_checksum(&projection("Agent ID.").flat).unwrap();
        let b = GenerationManifest::calculate_checksum(&projection("Agent ID.").flat).unwrap();
        let c = GenerationManifest::calculate_checksum(&projection("Changed.").flat).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_verify_detects_drift() {
        let manifest = GenerationManifest::new("8.11.0", &projection("Agent ID."), false).unwrap();
        manifest.verify(&projection("Agent ID.")).unwrap();
        assert!(matches!(
            manifest.verify(&projection("Changed.")),
            Err(LoaderError::InvalidChecksum { .. })
        ));
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(MANIFEST_FILE);

        let manifest = GenerationManifest::new("8.11.0", &projection("Agent ID."), false).unwrap();
        manifest.save(&path).unwrap();
        assert_eq!(GenerationManifest::load(&path).unwrap(), manifest);
    }
}
