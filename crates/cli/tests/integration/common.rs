//! Shared test helpers for CLI integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Path to a file in the demos directory at the workspace root.
pub fn demo_path(relative: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("..")
    .join("..")
    .join("demos")
    .join(relative)
}

/// Path to a fixture shared with the library tests.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("..")
    .join("lib")
    .join("tests")
    .join("fixtures")
    .join(name)
}

pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

fn key(tag: &str) -> String {
  tag.replace(['/', ':'], "_")
}

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding a copy of the sales
/// demo engine, a fake container runtime with its own image store, and an
/// archive directory.
pub struct TestEnv {
  pub temp: TempDir,
  pub descriptor: PathBuf,
  runtime_script: PathBuf,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();

    let engine_dir = root.join("engine");
    std::fs::create_dir_all(&engine_dir).unwrap();
    for file in ["engine.toml", "sales.rs", "schema.json", "dependencies.txt"] {
      std::fs::copy(demo_path(&format!("sales/{file}")), engine_dir.join(file)).unwrap();
    }

    let runtime_dir = root.join("runtime");
    std::fs::create_dir_all(runtime_dir.join("state").join("images")).unwrap();
    std::fs::create_dir_all(runtime_dir.join("state").join("engines")).unwrap();
    let runtime_script = runtime_dir.join("fake-runtime.sh");
    std::fs::write(&runtime_script, fixture_content("fake-runtime.sh")).unwrap();

    std::fs::create_dir_all(root.join("archives")).unwrap();

    Self {
      temp,
      descriptor: engine_dir.join("engine.toml"),
      runtime_script,
    }
  }

  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  pub fn archive_dir(&self) -> PathBuf {
    self.root().join("archives")
  }

  fn state(&self) -> PathBuf {
    self.runtime_script.parent().unwrap().join("state")
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.root().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  pub fn register_engine(&self, tag: &str, script: &str) {
    std::fs::write(self.state().join("images").join(key(tag)), "").unwrap();
    std::fs::write(self.state().join("engines").join(key(tag)), script).unwrap();
  }

  pub fn has_image(&self, tag: &str) -> bool {
    self.state().join("images").join(key(tag)).exists()
  }

  pub fn runtime_calls(&self) -> Vec<String> {
    std::fs::read_to_string(self.state().join("calls"))
      .map(|s| s.lines().map(str::to_string).collect())
      .unwrap_or_default()
  }

  /// A reportbox command wired to the fake runtime.
  ///
  /// Sets environment variables for isolated testing:
  /// - `REPORTBOX_RUNTIME`: the fake runtime script, run through `sh`
  /// - `REPORTBOX_ARCHIVE_DIR`: isolated archive directory
  /// - `XDG_DATA_HOME`: isolated data path
  pub fn reportbox_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("reportbox");
    cmd.env("REPORTBOX_RUNTIME", format!("sh {}", self.runtime_script.display()));
    cmd.env("REPORTBOX_ARCHIVE_DIR", self.archive_dir());
    cmd.env("XDG_DATA_HOME", self.root().join("data"));
    for var in [
      "REPORTBOX_INVOKE_TIMEOUT",
      "REPORTBOX_BASE_IMAGE",
      "REPORTBOX_RUNTIME_IMAGE",
      "REPORTBOX_ASSETS_DIR",
      "RUST_LOG",
    ] {
      cmd.env_remove(var);
    }
    cmd
  }

  pub fn path_of(&self, relative: &str) -> PathBuf {
    self.root().join(relative)
  }

  pub fn exists(&self, relative: &str) -> bool {
    Path::new(&self.path_of(relative)).exists()
  }
}
