mod images;
mod invoke;
mod load;
mod package;
mod stage;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use reportbox_lib::config::Settings;
use reportbox_lib::engine::EngineDescriptor;
use reportbox_lib::image::{ArchiveStore, BuildRequest, ImageBuilder};
use reportbox_lib::template::TemplateSet;

pub use images::cmd_images;
pub use invoke::{InvokeArgs, cmd_invoke};
pub use load::cmd_load;
pub use package::cmd_package;
pub use stage::cmd_stage;

/// Options shared by `package` and `stage`.
#[derive(Debug, Clone, Default, Args)]
pub struct BuildOptions {
  /// Extra dependency list, replacing the descriptor's `requirements`
  #[arg(long)]
  pub requirements: Option<PathBuf>,

  /// Build-stage image (overrides REPORTBOX_BASE_IMAGE)
  #[arg(long)]
  pub base_image: Option<String>,

  /// Runtime-stage image (overrides REPORTBOX_RUNTIME_IMAGE)
  #[arg(long)]
  pub runtime_image: Option<String>,

  /// Stage the build context here instead of a temporary directory
  #[arg(long)]
  pub context_dir: Option<PathBuf>,

  /// Directory with Dockerfile.tmpl / main.rs.tmpl overrides
  #[arg(long)]
  pub templates: Option<PathBuf>,
}

impl BuildOptions {
  pub fn builder(&self, settings: &Settings) -> Result<ImageBuilder> {
    let templates = match &self.templates {
      Some(dir) => TemplateSet::from_dir(dir).with_context(|| format!("Failed to load templates from {}", dir.display()))?,
      None => TemplateSet::builtin(),
    };
    Ok(
      ImageBuilder::new(settings.container_runtime())
        .with_core(settings.core_artifacts())
        .with_templates(templates),
    )
  }

  pub fn request(&self, descriptor: &Path, image: &str, settings: &Settings) -> Result<BuildRequest> {
    let descriptor = EngineDescriptor::load(descriptor)?;
    let mut request = BuildRequest::new(descriptor, image);
    request.context_dir = self.context_dir.clone();
    request.user_requirements = self.requirements.clone();
    request.base_images = settings.base_images();
    if let Some(image) = &self.base_image {
      request.base_images.build = image.clone();
    }
    if let Some(image) = &self.runtime_image {
      request.base_images.runtime = image.clone();
    }
    Ok(request)
  }
}

/// Open the archive directory from `dir` or the settings, creating it if asked.
pub fn archive_store(settings: &Settings, dir: Option<PathBuf>, create: bool) -> Result<ArchiveStore> {
  let dir = dir.unwrap_or_else(|| settings.archive_dir.clone());
  if create {
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create archive directory {}", dir.display()))?;
  }
  Ok(ArchiveStore::open(dir)?)
}
