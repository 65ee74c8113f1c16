//! Image building, exporting and loading.
//!
//! [`ImageBuilder`] turns an engine descriptor into an image in the runtime's
//! local store (and optionally an archive file); [`ImageLoader`] imports such
//! an archive on another host. [`ArchiveStore`] manages a directory of
//! archives named after their images.

mod archive;

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::context::{self, BaseImages, ContextError, CoreArtifacts, StagedContext};
use crate::engine::EngineDescriptor;
use crate::manifest::{self, MergeOutcome};
use crate::runtime::{ContainerRuntime, RuntimeError};
use crate::template::TemplateSet;

pub use archive::{ArchiveEntry, ArchiveStore};

/// Errors from packaging an engine into an image.
#[derive(Debug, Error)]
pub enum PackageError {
  #[error(transparent)]
  Context(#[from] ContextError),

  #[error("failed to create temporary build context: {0}")]
  TempDir(#[source] std::io::Error),

  #[error("building image '{image}' failed: {source}")]
  BuildFailed {
    image: String,
    #[source]
    source: RuntimeError,
  },

  #[error("exporting image '{image}' to {} failed: {source}", archive.display())]
  ExportFailed {
    image: String,
    archive: PathBuf,
    #[source]
    source: RuntimeError,
  },
}

impl PackageError {
  /// Diagnostic text reported by the container runtime, if any.
  pub fn diagnostics(&self) -> Option<&str> {
    match self {
      PackageError::BuildFailed { source, .. } | PackageError::ExportFailed { source, .. } => source.diagnostics(),
      _ => None,
    }
  }
}

/// Errors from importing an image archive.
#[derive(Debug, Error)]
pub enum LoadError {
  #[error("image archive not found: {}", path.display())]
  ImageNotFound { path: PathBuf },

  #[error("loading image archive {} failed: {source}", path.display())]
  LoadFailed {
    path: PathBuf,
    #[source]
    source: RuntimeError,
  },

  #[error("archive directory does not exist: {}", path.display())]
  ArchiveDirMissing { path: PathBuf },

  #[error("failed to read archive directory {}: {source}", path.display())]
  ReadDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Everything needed to package one engine.
#[derive(Debug, Clone)]
pub struct BuildRequest {
  pub descriptor: EngineDescriptor,
  pub image_name: String,
  /// Where to stage the build context. A fresh temporary directory when unset.
  pub context_dir: Option<PathBuf>,
  /// Export the built image to this archive file.
  pub archive: Option<PathBuf>,
  pub base_images: BaseImages,
  /// Overrides the descriptor's own requirements file.
  pub user_requirements: Option<PathBuf>,
}

impl BuildRequest {
  pub fn new(descriptor: EngineDescriptor, image_name: impl Into<String>) -> Self {
    Self {
      descriptor,
      image_name: image_name.into(),
      context_dir: None,
      archive: None,
      base_images: BaseImages::default(),
      user_requirements: None,
    }
  }

  fn requirements(&self) -> Option<&Path> {
    self
      .user_requirements
      .as_deref()
      .or_else(|| self.descriptor.requirements())
  }
}

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuiltImage {
  pub image: String,
  pub digest: String,
  pub archive: Option<PathBuf>,
  pub dependencies: usize,
}

/// Packages engines into images using a container runtime.
#[derive(Debug, Clone, Default)]
pub struct ImageBuilder {
  runtime: ContainerRuntime,
  core: CoreArtifacts,
  templates: TemplateSet,
}

impl ImageBuilder {
  pub fn new(runtime: ContainerRuntime) -> Self {
    Self {
      runtime,
      core: CoreArtifacts::default(),
      templates: TemplateSet::builtin(),
    }
  }

  pub fn with_core(mut self, core: CoreArtifacts) -> Self {
    self.core = core;
    self
  }

  pub fn with_templates(mut self, templates: TemplateSet) -> Self {
    self.templates = templates;
    self
  }

  pub fn runtime(&self) -> &ContainerRuntime {
    &self.runtime
  }

  /// Merge the base dependency list with the request's user list.
  ///
  /// An outcome with no sources is valid; the caller decides whether to warn.
  pub fn merge_dependencies(&self, request: &BuildRequest) -> Result<MergeOutcome, ContextError> {
    let base = self.core.base_dependencies()?;
    let user = match request.requirements() {
      Some(path) => manifest::read_list(path)?,
      None => None,
    };
    Ok(MergeOutcome {
      base_found: base.is_some(),
      user_found: user.is_some(),
      manifest: manifest::merge_manifests(base.unwrap_or_default(), user),
    })
  }

  /// Assemble the build context for `request` into `target_dir` and keep it.
  pub fn stage(&self, request: &BuildRequest, target_dir: &Path) -> Result<StagedContext, PackageError> {
    if let Some(path) = &request.user_requirements {
      context::check_target(target_dir, &[path.as_path()])?;
    }
    let outcome = self.merge_dependencies(request)?;
    if outcome.no_sources() {
      warn!(
        engine = %request.descriptor.module(),
        "no dependency lists found, the manifest is empty"
      );
    }
    Ok(context::assemble(
      &request.descriptor,
      &self.core,
      &self.templates,
      &outcome.manifest,
      &request.base_images,
      target_dir,
    )?)
  }

  /// Stage, build and optionally export an image.
  ///
  /// The build context is removed after the attempt whether or not the
  /// build succeeded.
  pub async fn build(&self, request: &BuildRequest) -> Result<BuiltImage, PackageError> {
    // Keeps the temporary parent alive until the context is removed.
    let (_temp, target_dir) = match &request.context_dir {
      Some(dir) => (None, dir.clone()),
      None => {
        let temp = TempDir::with_prefix("reportbox-context-").map_err(PackageError::TempDir)?;
        let dir = temp.path().join("context");
        (Some(temp), dir)
      }
    };

    let staged = match self.stage(request, &target_dir) {
      Ok(staged) => staged,
      Err(err) => {
        if let PackageError::Context(
          ContextError::RemoveDir { .. }
          | ContextError::CreateDir { .. }
          | ContextError::WriteFile { .. }
          | ContextError::CopyFile { .. }
          | ContextError::ReadFile { .. },
        ) = &err
        {
          discard(&target_dir);
        }
        return Err(err);
      }
    };

    let result = self.build_staged(request, &staged).await;
    if let Err(err) = staged.remove() {
      warn!(dir = %staged.dir.display(), error = %err, "failed to remove build context");
    } else {
      debug!(dir = %staged.dir.display(), "removed build context");
    }
    result
  }

  async fn build_staged(&self, request: &BuildRequest, staged: &StagedContext) -> Result<BuiltImage, PackageError> {
    let image = &request.image_name;
    info!(image = %image, runtime = %self.runtime.command_line(), "building image");
    self
      .runtime
      .build(image, &staged.dockerfile, &staged.dir, Some(&staged.digest))
      .await
      .map_err(|source| PackageError::BuildFailed {
        image: image.clone(),
        source,
      })?;

    if let Some(archive) = &request.archive {
      info!(image = %image, archive = %archive.display(), "exporting image");
      self
        .runtime
        .save(image, archive)
        .await
        .map_err(|source| PackageError::ExportFailed {
          image: image.clone(),
          archive: archive.clone(),
          source,
        })?;
    }

    info!(image = %image, digest = %staged.digest, "image built");
    Ok(BuiltImage {
      image: image.clone(),
      digest: staged.digest.clone(),
      archive: request.archive.clone(),
      dependencies: staged.dependencies,
    })
  }
}

/// Best-effort removal of a partially staged directory.
///
/// Only called for failures raised after staging started; earlier failures
/// leave the target untouched.
fn discard(dir: &Path) {
  if !dir.exists() {
    return;
  }
  if let Err(err) = std::fs::remove_dir_all(dir) {
    warn!(dir = %dir.display(), error = %err, "failed to remove partial build context");
  }
}

/// Imports image archives into the runtime's local store.
#[derive(Debug, Clone, Default)]
pub struct ImageLoader {
  runtime: ContainerRuntime,
}

impl ImageLoader {
  pub fn new(runtime: ContainerRuntime) -> Self {
    Self { runtime }
  }

  /// Load `archive`, returning the runtime's report (e.g. `Loaded image: x`).
  ///
  /// # Errors
  ///
  /// - `LoadError::ImageNotFound` if `archive` does not exist; the runtime
  ///   is not called
  /// - `LoadError::LoadFailed` with the runtime's diagnostics otherwise
  pub async fn load(&self, archive: &Path) -> Result<String, LoadError> {
    if !archive.is_file() {
      return Err(LoadError::ImageNotFound {
        path: archive.to_path_buf(),
      });
    }

    info!(archive = %archive.display(), "loading image archive");
    let output = self
      .runtime
      .load(archive)
      .await
      .map_err(|source| LoadError::LoadFailed {
        path: archive.to_path_buf(),
        source,
      })?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }
}
