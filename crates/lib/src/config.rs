//! Runtime settings.
//!
//! Settings are layered: explicit values set by the caller (CLI flags) win
//! over environment variables, which win over built-in defaults.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::consts::{DEFAULT_BASE_IMAGE, DEFAULT_RUNTIME, DEFAULT_RUNTIME_IMAGE};
use crate::context::{BaseImages, CoreArtifacts};
use crate::paths;
use crate::runtime::ContainerRuntime;

pub const ENV_RUNTIME: &str = "REPORTBOX_RUNTIME";
pub const ENV_INVOKE_TIMEOUT: &str = "REPORTBOX_INVOKE_TIMEOUT";
pub const ENV_ARCHIVE_DIR: &str = "REPORTBOX_ARCHIVE_DIR";
pub const ENV_BASE_IMAGE: &str = "REPORTBOX_BASE_IMAGE";
pub const ENV_RUNTIME_IMAGE: &str = "REPORTBOX_RUNTIME_IMAGE";
pub const ENV_ASSETS_DIR: &str = "REPORTBOX_ASSETS_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid {var} '{value}': {message}")]
  InvalidTimeout {
    var: &'static str,
    value: String,
    message: String,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  /// Container runtime program (`docker`, `podman`, or a path)
  pub runtime: String,
  /// Deadline for a single invocation; `None` waits indefinitely
  pub invoke_timeout: Option<Duration>,
  pub archive_dir: PathBuf,
  pub base_image: String,
  pub runtime_image: String,
  /// Override directory for the shared interface and base dependency list
  pub assets_dir: Option<PathBuf>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      runtime: DEFAULT_RUNTIME.to_string(),
      invoke_timeout: None,
      archive_dir: paths::archive_dir(),
      base_image: DEFAULT_BASE_IMAGE.to_string(),
      runtime_image: DEFAULT_RUNTIME_IMAGE.to_string(),
      assets_dir: None,
    }
  }
}

fn env_value(var: &str) -> Option<String> {
  std::env::var(var).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse a human-readable duration such as `30s` or `2m 30s`.
pub fn parse_timeout(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
  let duration = humantime::parse_duration(value).map_err(|e| ConfigError::InvalidTimeout {
    var,
    value: value.to_string(),
    message: e.to_string(),
  })?;
  if duration.is_zero() {
    return Err(ConfigError::InvalidTimeout {
      var,
      value: value.to_string(),
      message: "must be greater than zero".to_string(),
    });
  }
  Ok(duration)
}

impl Settings {
  /// Defaults overlaid with `REPORTBOX_*` environment variables.
  pub fn from_env() -> Result<Self, ConfigError> {
    let defaults = Self::default();
    let invoke_timeout = match env_value(ENV_INVOKE_TIMEOUT) {
      Some(value) => Some(parse_timeout(ENV_INVOKE_TIMEOUT, &value)?),
      None => None,
    };

    Ok(Self {
      runtime: env_value(ENV_RUNTIME).unwrap_or(defaults.runtime),
      invoke_timeout,
      archive_dir: env_value(ENV_ARCHIVE_DIR).map(PathBuf::from).unwrap_or(defaults.archive_dir),
      base_image: env_value(ENV_BASE_IMAGE).unwrap_or(defaults.base_image),
      runtime_image: env_value(ENV_RUNTIME_IMAGE).unwrap_or(defaults.runtime_image),
      assets_dir: env_value(ENV_ASSETS_DIR).map(PathBuf::from),
    })
  }

  pub fn container_runtime(&self) -> ContainerRuntime {
    ContainerRuntime::new(&self.runtime)
  }

  pub fn base_images(&self) -> BaseImages {
    BaseImages {
      build: self.base_image.clone(),
      runtime: self.runtime_image.clone(),
    }
  }

  pub fn core_artifacts(&self) -> CoreArtifacts {
    match &self.assets_dir {
      Some(dir) => CoreArtifacts::Dir(dir.clone()),
      None => CoreArtifacts::Embedded,
    }
  }
}
