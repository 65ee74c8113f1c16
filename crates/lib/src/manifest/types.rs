//! The deduplicated dependency set written into a build context.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A set of dependency specifier lines.
///
/// Order is not significant; entries are kept sorted so the rendered file
/// (and therefore the build context digest) is deterministic.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyManifest {
  entries: BTreeSet<String>,
}

impl DependencyManifest {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build from lines, trimming each and skipping blanks and `#` comments.
  pub fn from_lines<I>(lines: I) -> Self
  where
    I: IntoIterator,
    I::Item: AsRef<str>,
  {
    let mut manifest = Self::new();
    manifest.extend(lines);
    manifest
  }

  /// Parse the contents of a dependency list file.
  pub fn parse(content: &str) -> Self {
    Self::from_lines(content.lines())
  }

  /// Add one entry. Returns `false` if it was blank, a comment, or already present.
  pub fn insert(&mut self, line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
      return false;
    }
    self.entries.insert(line.to_string())
  }

  pub fn extend<I>(&mut self, lines: I)
  where
    I: IntoIterator,
    I::Item: AsRef<str>,
  {
    for line in lines {
      self.insert(line.as_ref());
    }
  }

  pub fn union_with(&mut self, other: &DependencyManifest) {
    self.entries.extend(other.entries.iter().cloned());
  }

  pub fn contains(&self, line: &str) -> bool {
    self.entries.contains(line.trim())
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Newline-joined entries with a trailing newline; empty for an empty manifest.
  pub fn to_file_contents(&self) -> String {
    let mut out = String::new();
    for entry in &self.entries {
      out.push_str(entry);
      out.push('\n');
    }
    out
  }
}
