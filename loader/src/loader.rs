//! Fragment and subset loading with a builder for multiple sources.
//!
//! A fragment document is a YAML (`.yml`, `.yaml`) or JSON (`.json`) file
//! holding either one field group or a list of them. Sources are files or
//! directories; directory entries are read in sorted path order so that
//! assembly is reproducible.
//!
//! # Loading patterns
//!
//! ```no_run
//! use field_schema_loader::{FragmentLoader, load_fragments, load_subsets};
//!
//! // One directory of fragments
//! let groups = load_fragments("schemas/").unwrap();
//!
//! // Default fragments plus user-supplied ones, merged without overwrite
//! let schema = FragmentLoader::new()
//!     .schemas("schemas/")
//!     .include("custom/")
//!     .build()
//!     .unwrap()
//!     .resolve()
//!     .unwrap();
//!
//! // Several subset declarations unioned into one
//! let subset = load_subsets(&["subsets/minimal.yml", "subsets/extra/"]).unwrap();
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use field_schema_core::{FieldGroup, FieldNode, FieldTree, SchemaAssembler, SchemaError, SubsetSpec};
use serde::de::value::{MapAccessDeserializer, SeqAccessDeserializer};
use serde::de::{DeserializeOwned, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{LoaderError, Result};

const DOCUMENT_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

/// One group per document, or a list of them.
///
/// Dispatches on the document shape so that errors inside a group (a
/// repeated field name, a leaf without `type`) reach the caller as-is.
enum FragmentDocument {
    Many(Vec<FieldGroup>),
    One(FieldGroup),
}

impl<'de> Deserialize<'de> for FragmentDocument {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(FragmentDocumentVisitor)
    }
}

struct FragmentDocumentVisitor;

impl<'de> Visitor<'de> for FragmentDocumentVisitor {
    type Value = FragmentDocument;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a field group or a list of field groups")
    }

    fn visit_seq<A>(self, seq: A) -> std::result::Result<FragmentDocument, A::Error>
    where
        A: SeqAccess<'de>,
    {
        Vec::deserialize(SeqAccessDeserializer::new(seq)).map(FragmentDocument::Many)
    }

    fn visit_map<A>(self, map: A) -> std::result::Result<FragmentDocument, A::Error>
    where
        A: MapAccess<'de>,
    {
        FieldGroup::deserialize(MapAccessDeserializer::new(map)).map(FragmentDocument::One)
    }
}

/// Loads every field group from a fragment file or directory.
///
/// Groups come back in file order, then document order. Leaf names missing
/// from a document are filled from their mapping key, and surrounding
/// whitespace is trimmed from every string attribute.
///
/// # Errors
///
/// Returns [`LoaderError::IoError`] if a path cannot be read, or
/// [`LoaderError::InvalidDocument`] if a document is not a valid fragment,
/// including one that declares a field name twice under the same parent.
pub fn load_fragments(path: impl AsRef<Path>) -> Result<Vec<FieldGroup>> {
    let mut groups = Vec::new();

    for file in collect_documents(path.as_ref())? {
        let document: FragmentDocument = parse_document(&file)?;
        let parsed = match document {
            FragmentDocument::Many(many) => many,
            FragmentDocument::One(one) => vec![one],
        };
        debug!(file = %file.display(), groups = parsed.len(), "loaded fragment document");
        groups.extend(parsed.into_iter().map(normalize_group));
    }

    Ok(groups)
}

/// Loads subset declarations and unions them.
///
/// Each path is a declaration file or a directory of them.
///
/// # Errors
///
/// Returns [`SchemaError::EmptySubset`] (wrapped in [`LoaderError::Schema`])
/// if no declaration selects anything, plus the I/O and parse errors of
/// [`load_fragments`].
pub fn load_subsets<P: AsRef<Path>>(paths: &[P]) -> Result<SubsetSpec> {
    let mut subset = SubsetSpec::new();

    for path in paths {
        for file in collect_documents(path.as_ref())? {
            let spec: SubsetSpec = parse_document(&file)?;
            debug!(file = %file.display(), "loaded subset declaration");
            subset.merge_from(spec);
        }
    }

    if subset.is_empty() {
        return Err(SchemaError::EmptySubset.into());
    }
    Ok(subset)
}

/// Builder for assembling fragments from several sources.
///
/// Every source contributes to the same [`SchemaAssembler`]; unlike a
/// fallback chain, all sources are required and a group defined by two
/// sources is an error.
///
/// # Example
///
/// ```no_run
/// use field_schema_loader::FragmentLoader;
///
/// let assembler = FragmentLoader::new()
///     .schemas("/opt/schemas/")
///     .include("/opt/custom/")
///     .build()
///     .unwrap();
/// println!("{} groups loaded", assembler.len());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FragmentLoader {
    sources: Vec<PathBuf>,
}

impl FragmentLoader {
    /// Creates a loader with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the default fragment directory.
    pub fn schemas(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(path.into());
        self
    }

    /// Adds a user-supplied fragment file or directory.
    pub fn include(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(path.into());
        self
    }

    /// Returns the configured sources in load order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Loads every source into a fresh assembler.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::NoSources`] if nothing was configured, any
    /// [`load_fragments`] error, or
    /// [`SchemaError::DuplicateKey`] when two sources define the same group.
    pub fn build(self) -> Result<SchemaAssembler> {
        if self.sources.is_empty() {
            return Err(LoaderError::NoSources);
        }

        let mut assembler = SchemaAssembler::new();
        for source in &self.sources {
            let groups = load_fragments(source)?;
            info!(source = %source.display(), groups = groups.len(), "loading fragments");
            assembler.add_source(groups)?;
        }
        Ok(assembler)
    }
}

fn collect_documents(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let file_path = entry?.path();
        let is_document = file_path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext));
        if file_path.is_file() && is_document {
            files.push(file_path);
        }
    }
    files.sort();
    Ok(files)
}

fn parse_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)?;
    let invalid = |reason: String| LoaderError::InvalidDocument {
        path: path.to_path_buf(),
        reason,
    };

    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(&raw).map_err(|e| invalid(e.to_string()))
    } else {
        serde_yaml::from_str(&raw).map_err(|e| invalid(e.to_string()))
    }
}

fn normalize_group(mut group: FieldGroup) -> FieldGroup {
    group.name = group.name.trim().to_string();
    group.title = group.title.map(|t| t.trim().to_string());
    group.description = group.description.map(|d| d.trim().to_string());
    normalize_tree(&mut group.fields);
    group
}

fn normalize_tree(tree: &mut FieldTree) {
    for (key, node) in tree.iter_mut() {
        match node {
            FieldNode::Field(field) => {
                if field.name.trim().is_empty() {
                    field.name = key.clone();
                }
                field.name = field.name.trim().to_string();
                field.field_type = field.field_type.trim().to_string();
                field.description = field.description.trim().to_string();
                field.extra.values_mut().for_each(clean_string_value);
            }
            FieldNode::Nested(nested) => {
                nested.description = nested.description.take().map(|d| d.trim().to_string());
                normalize_tree(&mut nested.fields);
            }
        }
    }
}

/// Trims top-level string values; numbers, lists and maps are left alone.
fn clean_string_value(value: &mut Value) {
    if let Value::String(s) = value {
        let trimmed = s.trim();
        if trimmed.len() != s.len() {
            *s = trimmed.to_string();
        }
    }
}
