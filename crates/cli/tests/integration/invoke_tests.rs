//! Invoke command integration tests.

use predicates::prelude::*;

use super::common::{TestEnv, fixture_content};

fn sales_env() -> TestEnv {
  let env = TestEnv::new();
  env.register_engine("sales", &fixture_content("sales-engine.sh"));
  env
}

#[test]
fn invoke_writes_report_to_stdout() {
  let env = sales_env();
  let config = env.write_file("config.json", r#"{"title":"T","values":[10.0,20.0]}"#);

  env
    .reportbox_cmd()
    .args(["invoke", "sales", "--config"])
    .arg(&config)
    .assert()
    .success()
    .stdout(predicate::str::starts_with("Report Title: T\n"))
    .stdout(predicate::str::contains("Total: 30.00"));
}

#[test]
fn invoke_reads_config_from_stdin() {
  let env = sales_env();

  env
    .reportbox_cmd()
    .args(["invoke", "sales", "--config", "-"])
    .write_stdin(r#"{"title":"Q3","values":[1.5,2.5]}"#)
    .assert()
    .success()
    .stdout(predicate::str::contains("Total: 4.00"));
}

#[test]
fn invoke_writes_report_to_file() {
  let env = sales_env();
  let config = env.write_file("config.json", r#"{"title":"T","values":[5]}"#);
  let output = env.path_of("report.txt");

  env
    .reportbox_cmd()
    .args(["invoke", "sales", "--config"])
    .arg(&config)
    .arg("--output")
    .arg(&output)
    .assert()
    .success()
    .stdout(predicate::str::contains("Wrote report to"));

  let report = std::fs::read_to_string(&output).unwrap();
  assert!(report.contains("Total: 5.00"));
}

#[test]
fn invoke_failure_embeds_engine_stderr() {
  let env = TestEnv::new();
  env.register_engine(
    "broken",
    "cat > /dev/null\necho 'decode error: unexpected token' >&2\nexit 2\n",
  );
  let config = env.write_file("config.json", "{}");

  env
    .reportbox_cmd()
    .args(["invoke", "broken", "--config"])
    .arg(&config)
    .assert()
    .code(1)
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("decode error: unexpected token"));
}

#[test]
fn invoke_with_schema_rejects_before_running() {
  let env = sales_env();
  let config = env.write_file("config.json", r#"{"values":"lots"}"#);
  let schema = env.path_of("engine/schema.json");

  env
    .reportbox_cmd()
    .args(["invoke", "sales", "--config"])
    .arg(&config)
    .arg("--schema")
    .arg(&schema)
    .assert()
    .code(1)
    .stderr(predicate::str::contains("title: field required"))
    .stderr(predicate::str::contains("values: expected number_list"));

  assert!(env.runtime_calls().is_empty());
}

#[test]
fn invoke_interactive_prompts_from_schema() {
  let env = sales_env();
  let schema = env.path_of("engine/schema.json");

  env
    .reportbox_cmd()
    .args(["invoke", "sales", "--interactive", "--schema"])
    .arg(&schema)
    .write_stdin("Weekly\n3, 4\n\n\n")
    .assert()
    .success()
    .stdout(predicate::str::contains("Report Title: Weekly"))
    .stdout(predicate::str::contains("Total: 7.00"))
    .stderr(predicate::str::contains("title (string): "));
}

#[test]
fn invoke_timeout_cancels() {
  let env = TestEnv::new();
  env.register_engine("slow", "sleep 5\n");
  let config = env.write_file("config.json", "{}");

  env
    .reportbox_cmd()
    .args(["invoke", "slow", "--timeout", "300ms", "--config"])
    .arg(&config)
    .timeout(std::time::Duration::from_secs(4))
    .assert()
    .code(1)
    .stderr(predicate::str::contains("cancelled after 300ms"));
}

#[test]
fn invoke_check_image_fails_fast() {
  let env = TestEnv::new();
  let config = env.write_file("config.json", "{}");

  env
    .reportbox_cmd()
    .args(["invoke", "ghost", "--check-image", "--config"])
    .arg(&config)
    .assert()
    .code(1)
    .stderr(predicate::str::contains("image not found: ghost"));

  assert_eq!(env.runtime_calls(), vec!["image inspect ghost"]);
}
