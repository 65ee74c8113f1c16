//! Engine invocation over standard streams.
//!
//! One invocation is one child process: the configuration is written to its
//! stdin as compact JSON and the stream closed, stdout is collected as the
//! report, and stderr is the only failure channel. Writing and draining run
//! concurrently so large payloads cannot deadlock on full pipe buffers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::consts::APP_NAME;
use crate::runtime::{ContainerRuntime, RuntimeError};
use crate::schema::{ValidationError, Validator};

#[derive(Debug, Error)]
pub enum InvokeError {
  #[error(transparent)]
  ValidationFailed(#[from] ValidationError),

  #[error("image not found: {image}")]
  ImageNotFound { image: String },

  #[error("failed to start container runtime '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("engine exited with {}: {stderr}", exit_description(*code))]
  InvocationFailed { code: Option<i32>, stderr: String },

  #[error("invocation cancelled after {}", humantime::format_duration(*after))]
  Cancelled { after: Duration },

  #[error("failed to serialize configuration: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error("io error while talking to the engine: {0}")]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Runtime(#[from] RuntimeError),
}

fn exit_description(code: Option<i32>) -> String {
  match code {
    Some(code) => format!("status {code}"),
    None => "a signal".to_string(),
  }
}

/// Per-call options.
#[derive(Clone, Copy, Default)]
pub struct InvokeOptions<'a> {
  /// Kill the engine and fail with `Cancelled` once this elapses.
  pub deadline: Option<Duration>,
  /// Checked before anything is spawned.
  pub validator: Option<&'a (dyn Validator + Sync)>,
  /// Ask the runtime whether the image exists before running it.
  pub require_image: bool,
}

impl std::fmt::Debug for InvokeOptions<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("InvokeOptions")
      .field("deadline", &self.deadline)
      .field("validator", &self.validator.is_some())
      .field("require_image", &self.require_image)
      .finish()
  }
}

/// Runs packaged engines.
#[derive(Debug, Clone, Default)]
pub struct Invoker {
  runtime: ContainerRuntime,
}

impl Invoker {
  pub fn new(runtime: ContainerRuntime) -> Self {
    Self { runtime }
  }

  /// Invoke `image` with `config` and no pre-flight checks or deadline.
  pub async fn invoke(&self, image: &str, config: &Value) -> Result<Vec<u8>, InvokeError> {
    self.invoke_with(image, config, InvokeOptions::default()).await
  }

  /// Invoke `image` with `config`, returning the report bytes.
  ///
  /// Does not return until the engine process has exited (or been killed on
  /// deadline expiry). A zero exit with empty stdout is an empty report.
  pub async fn invoke_with(
    &self,
    image: &str,
    config: &Value,
    options: InvokeOptions<'_>,
  ) -> Result<Vec<u8>, InvokeError> {
    if let Some(validator) = options.validator {
      validator.validate(config)?;
    }
    if options.require_image && !self.runtime.image_exists(image).await? {
      return Err(InvokeError::ImageNotFound {
        image: image.to_string(),
      });
    }

    let payload = serde_json::to_vec(config)?;
    info!(image = %image, bytes = payload.len(), "invoking engine");

    let name = container_name();
    let mut child = self
      .runtime
      .command(&ContainerRuntime::run_args(image, &name))
      .spawn()
      .map_err(|source| InvokeError::Spawn {
        program: self.runtime.command_line(),
        source,
      })?;

    let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
    let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

    // The deadline covers the whole exchange: a descendant holding the pipes
    // open must not outlive it.
    let exchange = async {
      tokio::join!(child.wait(), feed(stdin, payload), drain(stdout), drain(stderr))
    };
    let finished = match options.deadline {
      None => Ok(exchange.await),
      Some(deadline) => tokio::time::timeout(deadline, exchange).await,
    };
    let (status, written, report, diagnostics) = match finished {
      Ok(results) => results,
      Err(_) => {
        let after = options.deadline.unwrap_or_default();
        warn!(image = %image, container = %name, after = %humantime::format_duration(after), "engine timed out");
        // Killing the client alone leaves the container running.
        if let Err(err) = self.runtime.kill(&name).await {
          warn!(container = %name, error = %err, "failed to stop timed-out container");
        }
        // kill() also waits, so the client is reaped before returning.
        if let Err(err) = child.kill().await {
          warn!(image = %image, error = %err, "failed to kill runtime client");
        }
        return Err(InvokeError::Cancelled { after });
      }
    };
    let status = status?;

    match written {
      Ok(()) => {}
      // The engine may exit without reading all of its input.
      Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => {
        debug!(image = %image, "engine closed stdin early");
      }
      Err(err) => return Err(InvokeError::Io(err)),
    }
    let report = report?;
    let diagnostics = diagnostics?;

    let stderr = String::from_utf8_lossy(&diagnostics).trim_end().to_string();
    if !status.success() {
      return Err(InvokeError::InvocationFailed {
        code: status.code(),
        stderr,
      });
    }

    if !stderr.is_empty() {
      debug!(image = %image, stderr = %stderr, "engine diagnostics");
    }
    if report.is_empty() {
      debug!(image = %image, "engine produced an empty report");
    }
    info!(image = %image, bytes = report.len(), "engine finished");
    Ok(report)
  }
}

fn missing_pipe(name: &str) -> InvokeError {
  InvokeError::Io(std::io::Error::new(
    std::io::ErrorKind::BrokenPipe,
    format!("engine {name} was not captured"),
  ))
}

/// A container name unique to this process and call.
fn container_name() -> String {
  static NEXT: AtomicU64 = AtomicU64::new(0);
  let nanos = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.subsec_nanos())
    .unwrap_or_default();
  format!(
    "{APP_NAME}-{}-{}-{nanos:09}",
    std::process::id(),
    NEXT.fetch_add(1, Ordering::Relaxed)
  )
}

/// Write the whole payload; `stdin` is dropped on return, which is the
/// engine's end of input.
async fn feed<W: AsyncWrite + Unpin>(mut stdin: W, payload: Vec<u8>) -> std::io::Result<()> {
  stdin.write_all(&payload).await
}

async fn drain<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<Vec<u8>> {
  let mut buf = Vec::new();
  reader.read_to_end(&mut buf).await?;
  Ok(buf)
}
