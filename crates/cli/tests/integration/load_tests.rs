//! Load command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn load_archive_file() {
  let env = TestEnv::new();
  let archive = env.write_file("sales.tar", "fake-image:sales\n");

  env
    .reportbox_cmd()
    .arg("load")
    .arg(&archive)
    .assert()
    .success()
    .stdout(predicate::str::contains("Loaded image: sales"));

  assert!(env.has_image("sales"));
}

#[test]
fn load_by_image_name() {
  let env = TestEnv::new();
  env.write_file("archives/inventory.tar", "fake-image:inventory\n");

  env
    .reportbox_cmd()
    .args(["load", "--image", "inventory"])
    .assert()
    .success();

  assert!(env.has_image("inventory"));
}

#[test]
fn load_corrupt_archive_surfaces_runtime_error() {
  let env = TestEnv::new();
  let archive = env.write_file("junk.tar", "garbage");

  env
    .reportbox_cmd()
    .arg("load")
    .arg(&archive)
    .assert()
    .code(1)
    .stderr(predicate::str::contains("archive/tar: invalid tar header"));
}

#[test]
fn load_unknown_image_name_is_not_found() {
  let env = TestEnv::new();

  env
    .reportbox_cmd()
    .args(["load", "--image", "ghost"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("image archive not found"));

  assert!(env.runtime_calls().is_empty());
}
