//! Generator configuration.
//!
//! Defines the YAML-serializable configuration that tells a generation run
//! where fragments, subsets and outputs live. Command-line arguments take
//! precedence over these values.
//!
//! # Example YAML
//!
//! ```yaml
//! schemas: schemas
//! include:
//!   - custom/
//! subset:
//!   - subsets/minimal.yml
//! out: build
//! version_file: version
//! intermediate_only: false
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default file name looked up by the CLI when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "field-schema.yml";

/// Top-level generator configuration.
///
/// # Examples
///
/// ```
/// use field_schema_loader::GeneratorConfig;
///
/// let config: GeneratorConfig = serde_yaml::from_str("include: [custom/]\n").unwrap();
/// assert_eq!(config.schemas.to_str(), Some("schemas"));
/// assert_eq!(config.include.len(), 1);
/// assert!(config.subset.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory of default fragment documents.
    pub schemas: PathBuf,
    /// Additional fragment files or directories.
    pub include: Vec<PathBuf>,
    /// Subset declaration files or directories.
    pub subset: Vec<PathBuf>,
    /// Output root; intermediate files go to `<out>/generated`.
    pub out: PathBuf,
    /// File holding the schema version string.
    pub version_file: PathBuf,
    /// Write only the nested and flat intermediate files, skipping the
    /// manifest.
    pub intermediate_only: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            schemas: PathBuf::from("schemas"),
            include: Vec::new(),
            subset: Vec::new(),
            out: PathBuf::from("."),
            version_file: PathBuf::from("version"),
            intermediate_only: false,
        }
    }
}

impl GeneratorConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::LoaderError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::LoaderError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns `true` if a subset was requested.
    pub fn has_subset(&self) -> bool {
        !self.subset.is_empty()
    }
}

/// Reads the schema version string, dropping trailing whitespace.
///
/// # Errors
///
/// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot be
/// read.
pub fn read_version(path: impl AsRef<Path>) -> Result<String> {
    let raw = std::fs::read_to_string(path)?;
    Ok(raw.trim_end().to_string())
}
