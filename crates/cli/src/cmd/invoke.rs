//! Implementation of the `reportbox invoke` command.
//!
//! The configuration comes from a JSON file, standard input (`--config -`),
//! or interactive prompts driven by the schema's field list. With a schema,
//! defaults are filled in and the configuration is validated before any
//! container starts.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use serde_json::Value;

use reportbox_lib::config::Settings;
use reportbox_lib::invoke::{InvokeOptions, Invoker};
use reportbox_lib::schema::{FieldSchema, Validator};

use crate::output::{format_bytes, format_duration, print_success};
use crate::prompts;

#[derive(Debug, Clone, Default)]
pub struct InvokeArgs {
  pub config: Option<PathBuf>,
  pub interactive: bool,
  pub schema: Option<PathBuf>,
  pub output: Option<PathBuf>,
  pub timeout: Option<Duration>,
  pub check_image: bool,
}

fn read_config(path: &Path) -> Result<Value> {
  let content = if path == Path::new("-") {
    let mut buf = String::new();
    io::stdin()
      .read_to_string(&mut buf)
      .context("Failed to read configuration from stdin")?;
    buf
  } else {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read configuration {}", path.display()))?
  };
  serde_json::from_str(&content).with_context(|| format!("Failed to parse configuration {}", path.display()))
}

pub fn cmd_invoke(image: &str, args: &InvokeArgs, settings: &Settings) -> Result<()> {
  let schema = match &args.schema {
    Some(path) => Some(FieldSchema::load(path)?),
    None => None,
  };

  let mut config = match (&args.config, &schema) {
    (Some(path), _) => read_config(path)?,
    (None, Some(schema)) if args.interactive => {
      let stdin = io::stdin();
      prompts::prompt_config(schema, &mut stdin.lock(), &mut io::stderr())?
    }
    _ => bail!("A configuration is required: use --config <file> or --interactive --schema <file>"),
  };

  if let (Some(schema), Some(object)) = (&schema, config.as_object_mut()) {
    schema.apply_defaults(object);
  }

  let options = InvokeOptions {
    deadline: args.timeout,
    validator: schema.as_ref().map(|s| s as &(dyn Validator + Sync)),
    require_image: args.check_image,
  };
  let invoker = Invoker::new(settings.container_runtime());
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let started = Instant::now();
  let report = rt
    .block_on(invoker.invoke_with(image, &config, options))
    .with_context(|| format!("Invoking '{}' failed", image))?;

  match &args.output {
    Some(path) => {
      std::fs::write(path, &report).with_context(|| format!("Failed to write report to {}", path.display()))?;
      print_success(&format!(
        "Wrote report to {} ({}) in {}",
        path.display(),
        format_bytes(report.len() as u64),
        format_duration(started.elapsed())
      ));
    }
    None => {
      let mut stdout = io::stdout().lock();
      stdout.write_all(&report).context("Failed to write report")?;
      stdout.flush()?;
    }
  }

  Ok(())
}
