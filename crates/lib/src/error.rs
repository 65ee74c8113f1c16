//! Crate-level error type.
//!
//! Each module reports its own error enum; [`Error`] wraps them so callers
//! running the whole pipeline can match on [`ErrorKind`] instead. No error is
//! retried anywhere in the library.

use thiserror::Error;

use crate::config::ConfigError;
use crate::context::ContextError;
use crate::engine::DescriptorError;
use crate::image::{LoadError, PackageError};
use crate::invoke::InvokeError;
use crate::manifest::ManifestError;
use crate::runtime::RuntimeError;
use crate::schema::{SchemaError, ValidationError};
use crate::template::TemplateError;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Descriptor(#[from] DescriptorError),

  #[error(transparent)]
  Schema(#[from] SchemaError),

  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error(transparent)]
  Template(#[from] TemplateError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error(transparent)]
  Context(#[from] ContextError),

  #[error(transparent)]
  Package(#[from] PackageError),

  #[error(transparent)]
  Load(#[from] LoadError),

  #[error(transparent)]
  Invoke(#[from] InvokeError),

  #[error(transparent)]
  Runtime(#[from] RuntimeError),

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  ArtifactMissing,
  BuildFailed,
  ExportFailed,
  LoadFailed,
  ImageNotFound,
  ValidationFailed,
  InvocationFailed,
  Cancelled,
  Template,
  Descriptor,
  Io,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Config(_) | Error::Descriptor(_) | Error::Schema(_) => ErrorKind::Descriptor,
      Error::Validation(_) => ErrorKind::ValidationFailed,
      Error::Template(_) => ErrorKind::Template,
      Error::Manifest(_) => ErrorKind::Io,
      Error::Context(err) => context_kind(err),
      Error::Package(err) => match err {
        PackageError::Context(err) => context_kind(err),
        PackageError::TempDir(_) => ErrorKind::Io,
        PackageError::BuildFailed { .. } => ErrorKind::BuildFailed,
        PackageError::ExportFailed { .. } => ErrorKind::ExportFailed,
      },
      Error::Load(err) => match err {
        LoadError::ImageNotFound { .. } => ErrorKind::ImageNotFound,
        LoadError::LoadFailed { .. } => ErrorKind::LoadFailed,
        LoadError::ArchiveDirMissing { .. } | LoadError::ReadDir { .. } => ErrorKind::Io,
      },
      Error::Invoke(err) => match err {
        InvokeError::ValidationFailed(_) => ErrorKind::ValidationFailed,
        InvokeError::ImageNotFound { .. } => ErrorKind::ImageNotFound,
        InvokeError::Cancelled { .. } => ErrorKind::Cancelled,
        InvokeError::InvocationFailed { .. } | InvokeError::Spawn { .. } | InvokeError::Runtime(_) => {
          ErrorKind::InvocationFailed
        }
        InvokeError::Serialize(_) | InvokeError::Io(_) => ErrorKind::Io,
      },
      Error::Runtime(_) | Error::Io(_) => ErrorKind::Io,
    }
  }

  /// Diagnostic text captured from the container runtime or the engine.
  pub fn diagnostics(&self) -> Option<&str> {
    match self {
      Error::Package(err) => err.diagnostics(),
      Error::Load(LoadError::LoadFailed { source, .. }) => source.diagnostics(),
      Error::Invoke(InvokeError::InvocationFailed { stderr, .. }) => Some(stderr),
      Error::Invoke(InvokeError::Runtime(err)) | Error::Runtime(err) => err.diagnostics(),
      _ => None,
    }
  }
}

fn context_kind(err: &ContextError) -> ErrorKind {
  match err {
    ContextError::ArtifactMissing { .. } => ErrorKind::ArtifactMissing,
    ContextError::Template(_) => ErrorKind::Template,
    _ => ErrorKind::Io,
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
