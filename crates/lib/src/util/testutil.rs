//! Test utilities for reportbox-lib.
//!
//! [`FakeRuntime`] stages the shell-script runtime from
//! `tests/fixtures/fake-runtime.sh` into a temporary directory and hands out
//! a [`ContainerRuntime`] pointing at it.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::runtime::ContainerRuntime;

const FAKE_RUNTIME: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/fake-runtime.sh"));

pub const SALES_ENGINE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sales-engine.sh"));

pub struct FakeRuntime {
  pub temp: TempDir,
  script: PathBuf,
}

fn key(tag: &str) -> String {
  tag.replace(['/', ':'], "_")
}

impl FakeRuntime {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let script = temp.path().join("fake-runtime.sh");
    fs::write(&script, FAKE_RUNTIME).unwrap();
    fs::create_dir_all(temp.path().join("state").join("images")).unwrap();
    fs::create_dir_all(temp.path().join("state").join("engines")).unwrap();
    fs::create_dir_all(temp.path().join("state").join("containers")).unwrap();
    Self { temp, script }
  }

  /// A runtime that runs the fake script through `sh`.
  pub fn runtime(&self) -> ContainerRuntime {
    ContainerRuntime::new(format!("sh {}", self.script.display()))
  }

  pub fn state(&self) -> PathBuf {
    self.temp.path().join("state")
  }

  pub fn register_image(&self, tag: &str) {
    fs::write(self.state().join("images").join(key(tag)), "").unwrap();
  }

  /// Register `tag` with a shell script run as the container process.
  pub fn register_engine(&self, tag: &str, script: &str) {
    self.register_image(tag);
    fs::write(self.state().join("engines").join(key(tag)), script).unwrap();
  }

  pub fn has_image(&self, tag: &str) -> bool {
    self.state().join("images").join(key(tag)).exists()
  }

  /// Runtime invocations so far, one line of arguments each.
  pub fn calls(&self) -> Vec<String> {
    read_lines(&self.state().join("calls"))
  }

  /// Directory listing of the last build context, as seen during the build.
  pub fn last_context(&self) -> Vec<String> {
    read_lines(&self.state().join("last-context"))
  }

  pub fn last_label(&self) -> Option<String> {
    fs::read_to_string(self.state().join("last-label"))
      .ok()
      .map(|s| s.trim().to_string())
  }
}

fn read_lines(path: &Path) -> Vec<String> {
  fs::read_to_string(path)
    .map(|s| s.lines().map(str::to_string).collect())
    .unwrap_or_default()
}
