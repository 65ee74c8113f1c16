//! Implementation of the `reportbox stage` command.
//!
//! Assembles the build context into a directory and leaves it there, for
//! inspection or for building with the runtime by hand.

use std::path::Path;

use anyhow::{Context, Result};

use reportbox_lib::config::Settings;

use super::BuildOptions;
use crate::output::{self, print_stat, print_success};

pub fn cmd_stage(descriptor: &Path, dir: &Path, options: &BuildOptions, settings: &Settings) -> Result<()> {
  // The image name is not used when only staging.
  let request = options.request(descriptor, "", settings)?;
  let builder = options.builder(settings)?;

  let staged = builder
    .stage(&request, dir)
    .with_context(|| format!("Staging into {} failed", dir.display()))?;

  let dir = dunce::canonicalize(&staged.dir).unwrap_or_else(|_| staged.dir.clone());
  print_success(&format!("Staged build context in {}", dir.display()));
  print_stat("Digest", &staged.digest);
  println!();
  println!("Files:");
  println!("  {} Dockerfile", output::symbols::INFO);
  for file in &staged.files {
    println!("  {} {}", output::symbols::INFO, file);
  }

  Ok(())
}
