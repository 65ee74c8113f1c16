//! A directory of image archives, one `<image>.tar` per image.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{ImageLoader, LoadError};
use crate::consts::ARCHIVE_EXTENSION;

/// An archive listed by [`ArchiveStore::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
  pub image: String,
  pub path: PathBuf,
  pub size: u64,
}

#[derive(Debug, Clone)]
pub struct ArchiveStore {
  dir: PathBuf,
}

impl ArchiveStore {
  /// Open an existing archive directory.
  pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LoadError> {
    let dir = dir.into();
    if !dir.is_dir() {
      return Err(LoadError::ArchiveDirMissing { path: dir });
    }
    Ok(Self { dir })
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// Where the archive for `image` lives (or would live).
  pub fn archive_path(&self, image: &str) -> PathBuf {
    self.dir.join(format!("{image}.{ARCHIVE_EXTENSION}"))
  }

  /// Load the archive for `image` through `loader`.
  pub async fn load(&self, loader: &ImageLoader, image: &str) -> Result<String, LoadError> {
    loader.load(&self.archive_path(image)).await
  }

  /// Archives in the directory, sorted by image name.
  pub fn list(&self) -> Result<Vec<ArchiveEntry>, LoadError> {
    let read_err = |source| LoadError::ReadDir {
      path: self.dir.clone(),
      source,
    };
    let mut entries = Vec::new();
    for entry in fs::read_dir(&self.dir).map_err(read_err)? {
      let entry = entry.map_err(read_err)?;
      let path = entry.path();
      if path.extension().and_then(|e| e.to_str()) != Some(ARCHIVE_EXTENSION) {
        continue;
      }
      let metadata = entry.metadata().map_err(read_err)?;
      if !metadata.is_file() {
        continue;
      }
      let Some(image) = path.file_stem().and_then(|s| s.to_str()) else {
        continue;
      };
      entries.push(ArchiveEntry {
        image: image.to_string(),
        size: metadata.len(),
        path,
      });
    }
    entries.sort_by(|a, b| a.image.cmp(&b.image));
    Ok(entries)
  }
}
