//! Core artifacts staged into every build context.
//!
//! The shared engine interface and the base dependency list ship embedded in
//! the library. An override directory can replace both, e.g. to pin a
//! different `serde_json` version for every engine.

use std::fs;
use std::path::PathBuf;

use super::ContextError;
use crate::manifest::{self, DependencyManifest};

/// Filename of the shared interface inside a build context.
pub const INTERFACE_FILENAME: &str = "report_engine.rs";

/// Filename of the base dependency list inside an override directory.
pub const BASE_DEPENDENCIES_FILENAME: &str = "base-dependencies.txt";

/// Embedded shared interface.
pub const REPORT_ENGINE_INTERFACE: &str =
  include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets/report_engine.rs"));

/// Embedded base dependency list.
pub const BASE_DEPENDENCIES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets/base-dependencies.txt"));

/// Where the core's own artifacts come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CoreArtifacts {
  /// Compiled into the library
  #[default]
  Embedded,
  /// Read from a directory holding `report_engine.rs` and `base-dependencies.txt`
  Dir(PathBuf),
}

impl CoreArtifacts {
  /// Contents of the shared interface file.
  pub fn interface(&self) -> Result<String, ContextError> {
    match self {
      CoreArtifacts::Embedded => Ok(REPORT_ENGINE_INTERFACE.to_string()),
      CoreArtifacts::Dir(dir) => {
        let path = dir.join(INTERFACE_FILENAME);
        if !path.is_file() {
          return Err(ContextError::ArtifactMissing { path });
        }
        fs::read_to_string(&path).map_err(|source| ContextError::ReadFile { path, source })
      }
    }
  }

  /// The base dependency list, `None` if an override directory has none.
  pub fn base_dependencies(&self) -> Result<Option<DependencyManifest>, ContextError> {
    match self {
      CoreArtifacts::Embedded => Ok(Some(DependencyManifest::parse(BASE_DEPENDENCIES))),
      CoreArtifacts::Dir(dir) => Ok(manifest::read_list(&dir.join(BASE_DEPENDENCIES_FILENAME))?),
    }
  }
}
