//! Compile a staged build context with the host's cargo and drive the
//! resulting binary over stdio, as the image entry point is driven.
//!
//! Needs a Rust toolchain and the `serde_json` crate (cached or fetchable),
//! so it only runs with `cargo test -- --ignored`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use reportbox_lib::image::{BuildRequest, ImageBuilder};
use tempfile::TempDir;

use super::common::demo_descriptor;

struct CompiledEngine {
  _temp: TempDir,
  binary: PathBuf,
}

/// The `Cargo.toml` header the Dockerfile writes with `printf`.
fn cargo_header(dockerfile: &str) -> String {
  let line = dockerfile
    .lines()
    .find(|line| line.starts_with("RUN printf '"))
    .expect("Dockerfile writes Cargo.toml with printf");
  let body = line
    .trim_start_matches("RUN printf '")
    .split('\'')
    .next()
    .unwrap();
  body.replace("\\n", "\n")
}

fn compile_demo_engine() -> CompiledEngine {
  let temp = TempDir::new().unwrap();
  let staged = ImageBuilder::default()
    .stage(&BuildRequest::new(demo_descriptor(), "sales"), &temp.path().join("context"))
    .unwrap();

  // Same layout the build stage creates: staged files under src/, the
  // dependency list appended to the generated Cargo.toml.
  let crate_dir = temp.path().join("engine");
  let src = crate_dir.join("src");
  fs::create_dir_all(&src).unwrap();
  for file in &staged.files {
    fs::copy(staged.dir.join(file), src.join(file)).unwrap();
  }
  let dockerfile = fs::read_to_string(&staged.dockerfile).unwrap();
  let dependencies = fs::read_to_string(staged.dir.join("dependencies.txt")).unwrap();
  // An empty [workspace] keeps cargo from attaching the crate to an enclosing workspace.
  let manifest = format!("{}{}\n[workspace]\n", cargo_header(&dockerfile), dependencies);
  fs::write(crate_dir.join("Cargo.toml"), manifest).unwrap();

  let status = Command::new(option_env!("CARGO").unwrap_or("cargo"))
    .arg("build")
    .arg("--quiet")
    .arg("--manifest-path")
    .arg(crate_dir.join("Cargo.toml"))
    .arg("--target-dir")
    .arg(temp.path().join("target"))
    .status()
    .expect("cargo is available");
  assert!(status.success(), "staged engine failed to compile");

  let binary = temp
    .path()
    .join("target")
    .join("debug")
    .join(format!("report-engine{}", std::env::consts::EXE_SUFFIX));
  assert!(binary.is_file());
  CompiledEngine { _temp: temp, binary }
}

struct Run {
  code: Option<i32>,
  stdout: String,
  stderr: String,
}

fn run(binary: &Path, input: &str) -> Run {
  let mut child = Command::new(binary)
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .unwrap();
  child.stdin.take().unwrap().write_all(input.as_bytes()).unwrap();
  let output = child.wait_with_output().unwrap();
  Run {
    code: output.status.code(),
    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
  }
}

#[test]
fn cargo_header_is_read_from_dockerfile() {
  let header = cargo_header("FROM x AS build\nRUN printf '[package]\\nname = \"e\"\\n' > Cargo.toml\n");
  assert_eq!(header, "[package]\nname = \"e\"\n");
}

#[test]
#[ignore = "compiles the staged demo engine with cargo"]
fn compiled_demo_engine_follows_exit_code_protocol() {
  let engine = compile_demo_engine();

  let ok = run(&engine.binary, r#"{"title":"T","values":[10.0,20.0]}"#);
  assert_eq!(ok.code, Some(0), "stderr: {}", ok.stderr);
  assert!(ok.stdout.starts_with("Report Title: T\n"));
  assert!(ok.stdout.contains("Sale: $10.00\n"));
  assert!(ok.stdout.contains("Total: 30.00"));

  let undecodable = run(&engine.binary, "{not json");
  assert_eq!(undecodable.code, Some(2));
  assert!(undecodable.stderr.starts_with("decode error: "));
  assert!(undecodable.stdout.is_empty());

  let invalid = run(&engine.binary, r#"{"values":[1]}"#);
  assert_eq!(invalid.code, Some(3));
  assert!(invalid.stderr.starts_with("validation error: "));
  assert!(invalid.stderr.contains("title"));
  assert!(invalid.stdout.is_empty());

  let no_summary = run(
    &engine.binary,
    r#"{"title":"Q","values":[1.5],"currency":"€","include_summary":false}"#,
  );
  assert_eq!(no_summary.code, Some(0));
  assert_eq!(no_summary.stdout, "Report Title: Q\nSale: €1.50\n");
}
