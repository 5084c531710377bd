//! Fragment loading and artifact writing for field schemas.
//!
//! This crate surrounds the [`field_schema_core`] engine with file system
//! plumbing: it reads fragment and subset documents, reads the generator
//! configuration and version file, and writes the intermediate files and
//! manifest of a generation run.
//!
//! # Quick start
//!
//! ```no_run
//! use field_schema_core::{apply_subset, project};
//! use field_schema_loader::{
//!     FragmentLoader, GenerationManifest, load_subsets, read_version, write_intermediate,
//! };
//!
//! let version = read_version("version").unwrap();
//! let schema = FragmentLoader::new()
//!     .schemas("schemas/")
//!     .include("custom/")
//!     .build()
//!     .unwrap()
//!     .resolve()
//!     .unwrap();
//!
//! let subset = load_subsets(&["subsets/"]).unwrap();
//! let projection = project(apply_subset(&subset, &schema).unwrap()).unwrap();
//!
//! write_intermediate(&projection, "build").unwrap();
//! GenerationManifest::new(&version, &projection, true)
//!     .unwrap()
//!     .save("build/generated/manifest.json")
//!     .unwrap();
//! ```

mod config;
mod error;
mod intermediate;
mod loader;
mod manifest;

pub use config::{DEFAULT_CONFIG_FILE, GeneratorConfig, read_version};
pub use error::{LoaderError, Result};
pub use intermediate::{FLAT_FILE, GENERATED_DIR, IntermediateFiles, NESTED_FILE, write_intermediate};
pub use loader::{FragmentLoader, load_fragments, load_subsets};
pub use manifest::{GenerationManifest, MANIFEST_FILE};
