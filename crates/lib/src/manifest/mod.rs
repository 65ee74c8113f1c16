//! Dependency manifest merging.
//!
//! The manifest written into a build context is the union of the core's base
//! dependency list and an optional engine-supplied list. Entries are opaque
//! dependency specifier lines (for Rust engines, Cargo dependency lines such
//! as `serde_json = "1"`); only exact duplicates are removed.

mod types;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub use types::DependencyManifest;

/// Default filename of the manifest inside a build context.
pub const MANIFEST_FILENAME: &str = "dependencies.txt";

/// Errors that can occur while reading dependency lists.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read dependency list {}: {source}", path.display())]
  ReadFile { path: PathBuf, source: std::io::Error },
}

/// Result of merging dependency list files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
  pub manifest: DependencyManifest,
  /// Whether the base list was present
  pub base_found: bool,
  /// Whether the user list was present
  pub user_found: bool,
}

impl MergeOutcome {
  /// Neither source contributed anything. Valid, but worth a warning.
  pub fn no_sources(&self) -> bool {
    !self.base_found && !self.user_found
  }
}

/// Union of a base dependency list and an optional user list.
pub fn merge<B, U>(base: B, user: Option<U>) -> DependencyManifest
where
  B: IntoIterator,
  B::Item: AsRef<str>,
  U: IntoIterator,
  U::Item: AsRef<str>,
{
  let mut manifest = DependencyManifest::from_lines(base);
  if let Some(user) = user {
    manifest.extend(user);
  }
  manifest
}

/// Read a dependency list file; `None` if it doesn't exist.
pub fn read_list(path: &Path) -> Result<Option<DependencyManifest>, ManifestError> {
  if !path.is_file() {
    debug!(path = %path.display(), "dependency list not found");
    return Ok(None);
  }
  let content = fs::read_to_string(path).map_err(|source| ManifestError::ReadFile {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(Some(DependencyManifest::parse(&content)))
}

/// Merge dependency list files.
///
/// An absent path (either `None` or a file that doesn't exist) contributes
/// nothing. Check [`MergeOutcome::no_sources`] to warn about an empty result.
pub fn merge_files(base: Option<&Path>, user: Option<&Path>) -> Result<MergeOutcome, ManifestError> {
  let base_list = match base {
    Some(path) => read_list(path)?,
    None => None,
  };
  let user_list = match user {
    Some(path) => read_list(path)?,
    None => None,
  };

  Ok(MergeOutcome {
    base_found: base_list.is_some(),
    user_found: user_list.is_some(),
    manifest: merge_manifests(base_list.unwrap_or_default(), user_list),
  })
}

/// Merge an already-loaded base manifest with an optional user manifest.
pub fn merge_manifests(mut base: DependencyManifest, user: Option<DependencyManifest>) -> DependencyManifest {
  if let Some(user) = user {
    base.union_with(&user);
  }
  base
}
