//! Implementation of the `reportbox load` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use reportbox_lib::config::Settings;
use reportbox_lib::image::ImageLoader;

use super::archive_store;
use crate::output::print_success;

/// Load `archive`, or the archive stored for `image`.
pub fn cmd_load(
  archive: Option<&Path>,
  image: Option<&str>,
  archive_dir: Option<PathBuf>,
  settings: &Settings,
) -> Result<()> {
  let loader = ImageLoader::new(settings.container_runtime());
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

  let report = match (archive, image) {
    (Some(archive), _) => rt
      .block_on(loader.load(archive))
      .with_context(|| format!("Loading {} failed", archive.display()))?,
    (None, Some(image)) => {
      let store = archive_store(settings, archive_dir, false)?;
      rt.block_on(store.load(&loader, image))
        .with_context(|| format!("Loading image '{}' failed", image))?
    }
    (None, None) => bail!("Either an archive path or --image is required"),
  };

  if report.is_empty() {
    print_success("Image loaded");
  } else {
    print_success(&report);
  }
  Ok(())
}
