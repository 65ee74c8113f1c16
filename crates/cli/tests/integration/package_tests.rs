//! Package and stage command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn package_builds_image() {
  let env = TestEnv::new();

  env
    .reportbox_cmd()
    .args(["package", "--image", "sales:1"])
    .arg(&env.descriptor)
    .assert()
    .success()
    .stdout(predicate::str::contains("Built image sales:1"))
    .stdout(predicate::str::contains("Dependencies: 1"));

  assert!(env.has_image("sales:1"));
  let calls = env.runtime_calls();
  assert_eq!(calls.len(), 1);
  assert!(calls[0].starts_with("build -t sales:1 -f "));
  assert!(calls[0].contains("--label reportbox.context="));
}

#[test]
fn package_exports_to_output() {
  let env = TestEnv::new();
  let archive = env.path_of("out/sales.tar");
  std::fs::create_dir_all(archive.parent().unwrap()).unwrap();

  env
    .reportbox_cmd()
    .args(["package", "--image", "sales", "--output"])
    .arg(&archive)
    .arg(&env.descriptor)
    .assert()
    .success()
    .stdout(predicate::str::contains("Archive:"));

  assert_eq!(std::fs::read_to_string(&archive).unwrap(), "fake-image:sales\n");
}

#[test]
fn package_save_uses_archive_dir() {
  let env = TestEnv::new();

  env
    .reportbox_cmd()
    .args(["package", "--image", "sales", "--save"])
    .arg(&env.descriptor)
    .assert()
    .success();

  assert!(env.archive_dir().join("sales.tar").exists());
}

#[test]
fn package_build_failure_reports_runtime_diagnostics() {
  let env = TestEnv::new();
  let context_dir = env.path_of("ctx");

  env
    .reportbox_cmd()
    .args(["package", "--image", "sales", "--base-image", "fail", "--context-dir"])
    .arg(&context_dir)
    .arg(&env.descriptor)
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Packaging 'sales' failed"))
    .stderr(predicate::str::contains("failed to resolve source metadata"));

  assert!(!context_dir.exists());
  assert!(!env.has_image("sales"));
}

#[test]
fn stage_keeps_context() {
  let env = TestEnv::new();
  let dir = env.path_of("staged");
  let extra = env.write_file("extra.txt", "chrono = \"0.4\"\n");

  env
    .reportbox_cmd()
    .args(["stage", "--dir"])
    .arg(&dir)
    .arg("--requirements")
    .arg(&extra)
    .arg(&env.descriptor)
    .assert()
    .success()
    .stdout(predicate::str::contains("Staged build context"))
    .stdout(predicate::str::contains("report_engine.rs"));

  for file in ["Dockerfile", "dependencies.txt", "main.rs", "sales.rs", "report_engine.rs", "schema.json"] {
    assert!(dir.join(file).exists(), "{file} not staged");
  }
  assert_eq!(
    std::fs::read_to_string(dir.join("dependencies.txt")).unwrap(),
    "chrono = \"0.4\"\nserde_json = \"1\"\n"
  );
  let dockerfile = std::fs::read_to_string(dir.join("Dockerfile")).unwrap();
  assert!(dockerfile.contains("FROM rust:1-slim AS build"));
  assert!(env.runtime_calls().is_empty());
}

#[test]
fn stage_with_template_override() {
  let env = TestEnv::new();
  let dir = env.path_of("staged");
  let templates = env.path_of("templates");
  env.write_file(
    "templates/Dockerfile.tmpl",
    "FROM {{base_image}}\n{{#files}}COPY {{.}} /src/{{.}}\n{{/files}}",
  );

  env
    .reportbox_cmd()
    .args(["stage", "--base-image", "custom:latest", "--templates"])
    .arg(&templates)
    .arg("--dir")
    .arg(&dir)
    .arg(&env.descriptor)
    .assert()
    .success();

  let dockerfile = std::fs::read_to_string(dir.join("Dockerfile")).unwrap();
  assert!(dockerfile.starts_with("FROM custom:latest\nCOPY dependencies.txt /src/dependencies.txt\n"));
}

#[test]
fn stage_into_engine_directory_is_refused() {
  let env = TestEnv::new();
  let engine_dir = env.path_of("engine");

  env
    .reportbox_cmd()
    .args(["stage", "--dir"])
    .arg(&engine_dir)
    .arg(&env.descriptor)
    .assert()
    .code(1)
    .stderr(predicate::str::contains("would delete"));

  for file in ["engine.toml", "sales.rs", "schema.json", "dependencies.txt"] {
    assert!(engine_dir.join(file).exists(), "{file} was deleted");
  }
}
