//! Intermediate files.
//!
//! The nested and flat projections are written as YAML so that the format
//! specific emitters, and humans, can consume them without re-running the
//! pipeline.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use field_schema_core::Projection;
use tracing::info;

use crate::error::Result;

/// Subdirectory of the output root holding generated artifacts.
pub const GENERATED_DIR: &str = "generated";
/// File name of the nested projection.
pub const NESTED_FILE: &str = "nested.yml";
/// File name of the flat projection.
pub const FLAT_FILE: &str = "flat.yml";

/// Paths written by [`write_intermediate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateFiles {
    pub dir: PathBuf,
    pub nested: PathBuf,
    pub flat: PathBuf,
}

/// Writes `nested.yml` and `flat.yml` under `<out_dir>/generated`.
///
/// Missing directories are created.
///
/// # Errors
///
/// Returns [`IoError`](crate::LoaderError::IoError) if a directory or file
/// cannot be written, or [`YamlError`](crate::LoaderError::YamlError) if
/// serialization fails.
pub fn write_intermediate(projection: &Projection, out_dir: impl AsRef<Path>) -> Result<IntermediateFiles> {
    let dir = out_dir.as_ref().join(GENERATED_DIR);
    fs::create_dir_all(&dir)?;

    let nested = dir.join(NESTED_FILE);
    serde_yaml::to_writer(BufWriter::new(fs::File::create(&nested)?), &projection.nested)?;

    let flat = dir.join(FLAT_FILE);
    serde_yaml::to_writer(BufWriter::new(fs::File::create(&flat)?), &projection.flat)?;

    info!(dir = %dir.display(), fields = projection.flat.len(), "wrote intermediate files");
    Ok(IntermediateFiles { dir, nested, flat })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use field_schema_core::{Field, FieldGroup, FlatSchema, ResolvedSchema, project};
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_write_intermediate_round_trips_through_yaml() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");

        let group = FieldGroup::new("agent")
            .with_field("id", Field::new("id", "keyword", "Agent ID.").with_attribute("example", "8a4f500d"));
        let projection = project(ResolvedSchema::from_groups(BTreeMap::from([(
            "agent".to_string(),
            group,
        )])))
        .unwrap();

        let files = write_intermediate(&projection, &out).unwrap();
        assert_eq!(files.dir, out.join(GENERATED_DIR));

        let nested: ResolvedSchema =
            serde_yaml::from_str(&fs::read_to_string(&files.nested).unwrap()).unwrap();
        assert_eq!(nested, projection.nested);

        let flat: FlatSchema = serde_yaml::from_str(&fs::read_to_string(&files.flat).unwrap()).unwrap();
        assert_eq!(flat, projection.flat);
    }
}
