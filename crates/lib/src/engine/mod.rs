//! Engine descriptors.
//!
//! An [`EngineDescriptor`] names the user implementation to package: its Rust
//! module, the engine type inside it, and the source and schema files on disk.
//! Descriptors are built explicitly (in code or from an `engine.toml` file);
//! nothing is discovered by inspecting running code.

mod file;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use file::{DESCRIPTOR_VERSION, DescriptorFile};

/// Module names the generated crate already uses.
const RESERVED_MODULES: &[&str] = &["main", "report_engine"];

/// Errors raised while constructing or loading a descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
  #[error("failed to read descriptor {}: {source}", path.display())]
  ReadFile { path: PathBuf, source: std::io::Error },

  #[error("failed to parse descriptor {}: {message}", path.display())]
  Parse { path: PathBuf, message: String },

  #[error("unsupported descriptor version {found} (expected {expected})")]
  UnsupportedVersion { found: u32, expected: u32 },

  #[error("'{0}' is not a valid Rust identifier")]
  InvalidIdentifier(String),

  #[error("module name '{0}' is reserved")]
  ReservedModule(String),

  #[error("source file {} does not define module '{module}'", source_path.display())]
  ModuleMismatch { module: String, source_path: PathBuf },

  #[error("engine source {} is not a Rust file (expected a .rs extension)", path.display())]
  NotRustSource { path: PathBuf },

  #[error("{} has no file name", path.display())]
  NoFileName { path: PathBuf },
}

/// Identifies a user engine implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineDescriptor {
  module: String,
  type_name: String,
  source: PathBuf,
  schema: PathBuf,
  requirements: Option<PathBuf>,
}

fn is_rust_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
    _ => return false,
  }
  name != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn file_name_of(path: &Path) -> Result<String, DescriptorError> {
  path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .ok_or_else(|| DescriptorError::NoFileName {
      path: path.to_path_buf(),
    })
}

impl EngineDescriptor {
  /// Create a descriptor, checking that the names can be used in the
  /// generated entry point.
  ///
  /// The source file's stem must equal `module`, since the entry point
  /// declares `mod <module>;` next to the copied file.
  pub fn new(
    module: impl Into<String>,
    type_name: impl Into<String>,
    source: impl Into<PathBuf>,
    schema: impl Into<PathBuf>,
  ) -> Result<Self, DescriptorError> {
    let module = module.into();
    let type_name = type_name.into();
    let source = source.into();
    let schema = schema.into();

    for name in [&module, &type_name] {
      if !is_rust_identifier(name) {
        return Err(DescriptorError::InvalidIdentifier(name.clone()));
      }
    }
    if RESERVED_MODULES.contains(&module.as_str()) {
      return Err(DescriptorError::ReservedModule(module));
    }
    if source.extension().and_then(|ext| ext.to_str()) != Some("rs") {
      return Err(DescriptorError::NotRustSource { path: source });
    }
    if source.file_stem().and_then(|stem| stem.to_str()) != Some(module.as_str()) {
      return Err(DescriptorError::ModuleMismatch {
        module,
        source_path: source,
      });
    }
    file_name_of(&schema)?;

    Ok(Self {
      module,
      type_name,
      source,
      schema,
      requirements: None,
    })
  }

  /// Attach an engine-specific dependency list.
  pub fn with_requirements(mut self, path: impl Into<PathBuf>) -> Self {
    self.requirements = Some(path.into());
    self
  }

  /// Load a descriptor from an `engine.toml` file.
  ///
  /// Relative paths inside the file are resolved against its (canonical)
  /// directory, so the descriptor stays valid if the working directory changes.
  pub fn load(path: &Path) -> Result<Self, DescriptorError> {
    let file = DescriptorFile::read(path)?;
    let parent = path
      .parent()
      .filter(|p| !p.as_os_str().is_empty())
      .unwrap_or(Path::new("."));
    let base_dir = dunce::canonicalize(parent).unwrap_or_else(|_| parent.to_path_buf());
    file.into_descriptor(&base_dir)
  }

  pub fn module(&self) -> &str {
    &self.module
  }

  pub fn type_name(&self) -> &str {
    &self.type_name
  }

  pub fn source(&self) -> &Path {
    &self.source
  }

  pub fn schema(&self) -> &Path {
    &self.schema
  }

  pub fn requirements(&self) -> Option<&Path> {
    self.requirements.as_deref()
  }

  /// Filename the engine source is staged under.
  pub fn source_file_name(&self) -> String {
    format!("{}.rs", self.module)
  }

  /// Filename the schema definition is staged under.
  pub fn schema_file_name(&self) -> String {
    // checked in new()
    file_name_of(&self.schema).unwrap_or_default()
  }
}
