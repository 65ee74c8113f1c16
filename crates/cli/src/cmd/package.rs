//! Implementation of the `reportbox package` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use reportbox_lib::config::Settings;

use super::BuildOptions;
use crate::output::{format_bytes, print_stat, print_success, truncate_hash};

/// Build the engine described by `descriptor` as `image`, exporting it to
/// `archive` when given.
pub fn cmd_package(
  descriptor: &Path,
  image: &str,
  archive: Option<PathBuf>,
  options: &BuildOptions,
  settings: &Settings,
) -> Result<()> {
  let mut request = options.request(descriptor, image, settings)?;
  request.archive = archive;
  let builder = options.builder(settings)?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let built = rt
    .block_on(builder.build(&request))
    .with_context(|| format!("Packaging '{}' failed", image))?;

  print_success(&format!("Built image {}", built.image));
  print_stat("Digest", truncate_hash(&built.digest));
  print_stat("Dependencies", &built.dependencies.to_string());
  if let Some(archive) = &built.archive {
    let size = std::fs::metadata(archive).map(|m| m.len()).unwrap_or(0);
    print_stat("Archive", &format!("{} ({})", archive.display(), format_bytes(size)));
  }

  Ok(())
}
