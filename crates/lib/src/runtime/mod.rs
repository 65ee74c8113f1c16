//! Container runtime adapter.
//!
//! Every interaction with the container runtime goes through its command-line
//! interface (`docker` or anything accepting the same verbs, such as
//! `podman`). Each call spawns one runtime process, captures its output, and
//! blocks until it exits. Diagnostics from a failed call are surfaced
//! verbatim.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::consts::{CONTEXT_LABEL, DEFAULT_RUNTIME};

/// Errors from running a runtime command.
#[derive(Debug, Error)]
pub enum RuntimeError {
  #[error("failed to start container runtime '{program}': {source}")]
  Spawn { program: String, source: std::io::Error },

  #[error("'{program} {verb}' failed with exit code {code:?}: {stderr}")]
  Failed {
    program: String,
    verb: String,
    code: Option<i32>,
    stderr: String,
  },
}

impl RuntimeError {
  /// Diagnostic text reported by the runtime, if it got that far.
  pub fn diagnostics(&self) -> Option<&str> {
    match self {
      RuntimeError::Failed { stderr, .. } => Some(stderr),
      _ => None,
    }
  }
}

/// Captured output of a successful runtime command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
  pub stdout: Vec<u8>,
  pub stderr: String,
}

/// Handle to a container runtime program.
///
/// The runtime is given as a command line: the program followed by any
/// arguments to place before every verb, e.g. `podman --remote`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRuntime {
  program: String,
  leading_args: Vec<String>,
}

impl Default for ContainerRuntime {
  fn default() -> Self {
    Self::new(DEFAULT_RUNTIME)
  }
}

impl ContainerRuntime {
  pub fn new(command_line: impl AsRef<str>) -> Self {
    let mut words = command_line.as_ref().split_whitespace().map(str::to_string);
    Self {
      program: words.next().unwrap_or_else(|| DEFAULT_RUNTIME.to_string()),
      leading_args: words.collect(),
    }
  }

  pub fn program(&self) -> &str {
    &self.program
  }

  /// The full runtime command line, for messages.
  pub fn command_line(&self) -> String {
    std::iter::once(self.program.as_str())
      .chain(self.leading_args.iter().map(String::as_str))
      .collect::<Vec<_>>()
      .join(" ")
  }

  /// `build -t <tag> -f <dockerfile> [--label reportbox.context=<digest>] <context>`
  pub fn build_args(tag: &str, dockerfile: &Path, context: &Path, digest: Option<&str>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["build".into(), "-t".into(), tag.into(), "-f".into(), dockerfile.into()];
    if let Some(digest) = digest {
      args.push("--label".into());
      args.push(format!("{CONTEXT_LABEL}={digest}").into());
    }
    args.push(context.into());
    args
  }

  /// `save -o <archive> <tag>`
  pub fn save_args(tag: &str, archive: &Path) -> Vec<OsString> {
    vec!["save".into(), "-o".into(), archive.into(), tag.into()]
  }

  /// `load -i <archive>`
  pub fn load_args(archive: &Path) -> Vec<OsString> {
    vec!["load".into(), "-i".into(), archive.into()]
  }

  /// `image inspect <tag>`
  pub fn inspect_args(tag: &str) -> Vec<OsString> {
    vec!["image".into(), "inspect".into(), tag.into()]
  }

  /// `run -i --rm --name <name> <tag>`: stdin attached, no TTY, container
  /// removed on exit. The name is what [`Self::kill`] addresses.
  pub fn run_args(tag: &str, name: &str) -> Vec<OsString> {
    vec![
      "run".into(),
      "-i".into(),
      "--rm".into(),
      "--name".into(),
      name.into(),
      tag.into(),
    ]
  }

  /// `kill <name>`
  pub fn kill_args(name: &str) -> Vec<OsString> {
    vec!["kill".into(), name.into()]
  }

  /// A command for this runtime with all three standard streams piped.
  pub fn command(&self, args: &[OsString]) -> Command {
    let mut command = Command::new(&self.program);
    command
      .args(&self.leading_args)
      .args(args)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);
    command
  }

  /// Run a runtime command to completion, failing on a non-zero exit.
  ///
  /// Standard input is closed immediately; the runtime never waits on it.
  pub async fn run_checked(&self, args: &[OsString]) -> Result<CommandOutput, RuntimeError> {
    let verb = args
      .first()
      .map(|a| a.to_string_lossy().into_owned())
      .unwrap_or_default();
    debug!(runtime = %self.command_line(), args = ?args, "running container runtime");

    let mut command = self.command(args);
    command.stdin(Stdio::null());
    let output = command.output().await.map_err(|source| RuntimeError::Spawn {
      program: self.command_line(),
      source,
    })?;

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if !output.status.success() {
      return Err(RuntimeError::Failed {
        program: self.command_line(),
        verb,
        code: output.status.code(),
        stderr: stderr.trim_end().to_string(),
      });
    }

    if !stderr.is_empty() {
      debug!(verb = %verb, stderr = %stderr.trim_end(), "container runtime diagnostics");
    }
    Ok(CommandOutput {
      stdout: output.stdout,
      stderr,
    })
  }

  pub async fn build(
    &self,
    tag: &str,
    dockerfile: &Path,
    context: &Path,
    digest: Option<&str>,
  ) -> Result<CommandOutput, RuntimeError> {
    self.run_checked(&Self::build_args(tag, dockerfile, context, digest)).await
  }

  pub async fn save(&self, tag: &str, archive: &Path) -> Result<CommandOutput, RuntimeError> {
    self.run_checked(&Self::save_args(tag, archive)).await
  }

  pub async fn load(&self, archive: &Path) -> Result<CommandOutput, RuntimeError> {
    self.run_checked(&Self::load_args(archive)).await
  }

  /// Stop a running container by name.
  pub async fn kill(&self, name: &str) -> Result<CommandOutput, RuntimeError> {
    self.run_checked(&Self::kill_args(name)).await
  }

  /// Whether the runtime's local store knows `tag`.
  pub async fn image_exists(&self, tag: &str) -> Result<bool, RuntimeError> {
    match self.run_checked(&Self::inspect_args(tag)).await {
      Ok(_) => Ok(true),
      Err(RuntimeError::Failed { .. }) => Ok(false),
      Err(e) => Err(e),
    }
  }
}
