//! Build context assembly.
//!
//! A build context is the flat directory handed to the container runtime's
//! build step. It is always created from scratch: anything already at the
//! target path is deleted first, so files from an earlier build can never
//! leak into the image. Files are staged in a fixed order which is also the
//! order of the `COPY` instructions in the rendered Dockerfile:
//!
//! 1. the merged dependency manifest
//! 2. the generated entry point
//! 3. the engine source
//! 4. the shared engine interface
//! 5. the engine's schema definition

mod artifacts;

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{
  BINARY_NAME, DEFAULT_BASE_IMAGE, DEFAULT_RUNTIME_IMAGE, DOCKERFILE_FILENAME, ENTRYPOINT_FILENAME,
};
use crate::engine::EngineDescriptor;
use crate::manifest::{DependencyManifest, MANIFEST_FILENAME, ManifestError};
use crate::template::{self, Params, TemplateError, TemplateSet};

pub use artifacts::{
  BASE_DEPENDENCIES, BASE_DEPENDENCIES_FILENAME, CoreArtifacts, INTERFACE_FILENAME, REPORT_ENGINE_INTERFACE,
};

/// Errors that can occur while assembling a build context.
#[derive(Debug, Error)]
pub enum ContextError {
  #[error("required artifact not found: {}", path.display())]
  ArtifactMissing { path: PathBuf },

  #[error("staged filename '{name}' is used by more than one artifact")]
  DuplicateFile { name: String },

  #[error("build context {} would delete {}; choose a directory outside the engine's files", target.display(), artifact.display())]
  TargetContainsSource { target: PathBuf, artifact: PathBuf },

  #[error("failed to remove stale context {}: {source}", path.display())]
  RemoveDir { path: PathBuf, source: std::io::Error },

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to read {}: {source}", path.display())]
  ReadFile { path: PathBuf, source: std::io::Error },

  #[error("failed to write {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: std::io::Error },

  #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
  CopyFile {
    from: PathBuf,
    to: PathBuf,
    source: std::io::Error,
  },

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error(transparent)]
  Template(#[from] TemplateError),
}

/// Images used by the two build stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseImages {
  /// Toolchain image that compiles the engine
  pub build: String,
  /// Image the compiled engine runs in
  pub runtime: String,
}

impl Default for BaseImages {
  fn default() -> Self {
    Self {
      build: DEFAULT_BASE_IMAGE.to_string(),
      runtime: DEFAULT_RUNTIME_IMAGE.to_string(),
    }
  }
}

/// A populated build context directory.
#[derive(Debug)]
pub struct StagedContext {
  pub dir: PathBuf,
  /// Staged filenames, in staging order (the Dockerfile is not included)
  pub files: Vec<String>,
  pub dockerfile: PathBuf,
  /// SHA-256 over staged names and contents in staging order, then the Dockerfile
  pub digest: String,
  /// Number of manifest entries written
  pub dependencies: usize,
}

impl StagedContext {
  /// Delete the context directory.
  pub fn remove(&self) -> Result<(), ContextError> {
    remove_dir(&self.dir)
  }
}

fn remove_dir(dir: &Path) -> Result<(), ContextError> {
  match fs::remove_dir_all(dir) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
    Err(source) => Err(ContextError::RemoveDir {
      path: dir.to_path_buf(),
      source,
    }),
  }
}

fn write_file(path: &Path, content: &[u8]) -> Result<(), ContextError> {
  fs::write(path, content).map_err(|source| ContextError::WriteFile {
    path: path.to_path_buf(),
    source,
  })
}

fn require(path: &Path) -> Result<(), ContextError> {
  if path.is_file() {
    Ok(())
  } else {
    Err(ContextError::ArtifactMissing {
      path: path.to_path_buf(),
    })
  }
}

/// Reject a target that is, or lies above, one of the engine's own files.
pub fn check_target(target_dir: &Path, artifacts: &[&Path]) -> Result<(), ContextError> {
  let Ok(target) = dunce::canonicalize(target_dir) else {
    // Nothing exists there yet, so nothing can be deleted.
    return Ok(());
  };
  for artifact in artifacts {
    let resolved = dunce::canonicalize(artifact).unwrap_or_else(|_| artifact.to_path_buf());
    if resolved.starts_with(&target) {
      return Err(ContextError::TargetContainsSource {
        target: target_dir.to_path_buf(),
        artifact: artifact.to_path_buf(),
      });
    }
  }
  Ok(())
}

fn hash_staged(dir: &Path, files: &[String]) -> Result<String, ContextError> {
  let mut hasher = Sha256::new();
  for name in files {
    let path = dir.join(name);
    let content = fs::read(&path).map_err(|source| ContextError::ReadFile { path, source })?;
    hasher.update(name.as_bytes());
    hasher.update([0u8]);
    hasher.update((content.len() as u64).to_le_bytes());
    hasher.update(&content);
  }
  Ok(hex::encode(hasher.finalize()))
}

/// Stage everything needed to build an image for `descriptor` into `target_dir`.
///
/// Every source artifact is checked before `target_dir` is touched, so a
/// missing file leaves an existing directory in place. Once staging starts,
/// any failure is fatal and the partial directory is left for the caller to
/// remove.
///
/// # Errors
///
/// - `ContextError::ArtifactMissing` if the engine source, schema, or an
///   overridden shared interface does not exist
/// - `ContextError::TargetContainsSource` if `target_dir` is or contains the
///   engine source, schema, or dependency list
/// - I/O and template errors while writing the context
pub fn assemble(
  descriptor: &EngineDescriptor,
  core: &CoreArtifacts,
  templates: &TemplateSet,
  manifest: &DependencyManifest,
  images: &BaseImages,
  target_dir: &Path,
) -> Result<StagedContext, ContextError> {
  require(descriptor.source())?;
  require(descriptor.schema())?;
  let interface = core.interface()?;

  let source_name = descriptor.source_file_name();
  let schema_name = descriptor.schema_file_name();
  let files = vec![
    MANIFEST_FILENAME.to_string(),
    ENTRYPOINT_FILENAME.to_string(),
    source_name.clone(),
    INTERFACE_FILENAME.to_string(),
    schema_name.clone(),
  ];
  for (index, name) in files.iter().enumerate() {
    if files[..index].contains(name) || name == DOCKERFILE_FILENAME {
      return Err(ContextError::DuplicateFile { name: name.clone() });
    }
  }

  // Render before touching the filesystem so template errors leave no trace.
  let entrypoint = templates.render(
    template::ENTRYPOINT,
    &Params::new()
      .text("module_name", descriptor.module())
      .text("type_name", descriptor.type_name())
      .text("schema_file", &schema_name),
  )?;
  let dockerfile = templates.render(
    template::DOCKERFILE,
    &Params::new()
      .text("base_image", &images.build)
      .text("runtime_image", &images.runtime)
      .text("manifest_file", MANIFEST_FILENAME)
      .text("entry_script", ENTRYPOINT_FILENAME)
      .text("binary_name", BINARY_NAME)
      .list("files", files.iter().cloned()),
  )?;

  let mut owned = vec![descriptor.source(), descriptor.schema()];
  owned.extend(descriptor.requirements());
  check_target(target_dir, &owned)?;

  if target_dir.exists() {
    debug!(dir = %target_dir.display(), "removing stale build context");
    remove_dir(target_dir)?;
  }
  fs::create_dir_all(target_dir).map_err(|source| ContextError::CreateDir {
    path: target_dir.to_path_buf(),
    source,
  })?;

  write_file(&target_dir.join(MANIFEST_FILENAME), manifest.to_file_contents().as_bytes())?;
  write_file(&target_dir.join(ENTRYPOINT_FILENAME), entrypoint.as_bytes())?;

  for (from, name) in [(descriptor.source(), &source_name), (descriptor.schema(), &schema_name)] {
    let to = target_dir.join(name);
    fs::copy(from, &to).map_err(|source| ContextError::CopyFile {
      from: from.to_path_buf(),
      to: to.clone(),
      source,
    })?;
  }
  write_file(&target_dir.join(INTERFACE_FILENAME), interface.as_bytes())?;

  let dockerfile_path = target_dir.join(DOCKERFILE_FILENAME);
  write_file(&dockerfile_path, dockerfile.as_bytes())?;

  let hashed: Vec<String> = files.iter().cloned().chain([DOCKERFILE_FILENAME.to_string()]).collect();
  let digest = hash_staged(target_dir, &hashed)?;
  info!(
    dir = %target_dir.display(),
    engine = %format!("{}::{}", descriptor.module(), descriptor.type_name()),
    dependencies = manifest.len(),
    digest = %digest,
    "build context staged"
  );

  Ok(StagedContext {
    dir: target_dir.to_path_buf(),
    files,
    dockerfile: dockerfile_path,
    digest,
    dependencies: manifest.len(),
  })
}
