//! Implementation of the `reportbox images` command.

use std::path::PathBuf;

use anyhow::Result;

use reportbox_lib::config::Settings;

use super::archive_store;
use crate::output::{OutputFormat, format_bytes, print_info, print_json, symbols};

pub fn cmd_images(archive_dir: Option<PathBuf>, format: OutputFormat, settings: &Settings) -> Result<()> {
  let store = archive_store(settings, archive_dir, false)?;
  let entries = store.list()?;

  if format.is_json() {
    return print_json(&entries);
  }

  if entries.is_empty() {
    print_info(&format!("No image archives in {}", store.dir().display()));
    return Ok(());
  }

  let width = entries.iter().map(|e| e.image.len()).max().unwrap_or(0);
  for entry in &entries {
    println!(
      "  {} {:width$}  {}",
      symbols::INFO,
      entry.image,
      format_bytes(entry.size),
      width = width
    );
  }
  Ok(())
}
