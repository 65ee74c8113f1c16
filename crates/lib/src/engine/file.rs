//! On-disk descriptor format (`engine.toml`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{DescriptorError, EngineDescriptor};

/// The only descriptor format version understood by this release.
pub const DESCRIPTOR_VERSION: u32 = 1;

/// Serialized form of an [`EngineDescriptor`].
///
/// ```toml
/// version = 1
/// module = "sales"
/// type = "SalesReportEngine"
/// source = "sales.rs"
/// schema = "schema.json"
/// requirements = "dependencies.txt"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptorFile {
  pub version: u32,
  pub module: String,
  #[serde(rename = "type")]
  pub type_name: String,
  pub source: PathBuf,
  pub schema: PathBuf,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub requirements: Option<PathBuf>,
}

impl DescriptorFile {
  pub fn read(path: &Path) -> Result<Self, DescriptorError> {
    let content = fs::read_to_string(path).map_err(|source| DescriptorError::ReadFile {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&content, path)
  }

  pub fn parse(content: &str, path: &Path) -> Result<Self, DescriptorError> {
    let file: DescriptorFile = toml::from_str(content).map_err(|e| DescriptorError::Parse {
      path: path.to_path_buf(),
      message: e.to_string(),
    })?;
    if file.version != DESCRIPTOR_VERSION {
      return Err(DescriptorError::UnsupportedVersion {
        found: file.version,
        expected: DESCRIPTOR_VERSION,
      });
    }
    Ok(file)
  }

  /// Convert into a descriptor, resolving relative paths against `base_dir`.
  pub fn into_descriptor(self, base_dir: &Path) -> Result<EngineDescriptor, DescriptorError> {
    let resolve = |path: PathBuf| if path.is_absolute() { path } else { base_dir.join(path) };

    let descriptor = EngineDescriptor::new(
      self.module,
      self.type_name,
      resolve(self.source),
      resolve(self.schema),
    )?;
    Ok(match self.requirements {
      Some(path) => descriptor.with_requirements(resolve(path)),
      None => descriptor,
    })
  }
}
