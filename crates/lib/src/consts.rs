//! Shared constants.

pub const APP_NAME: &str = "reportbox";

/// Filename of the rendered build descriptor inside a build context.
pub const DOCKERFILE_FILENAME: &str = "Dockerfile";

/// Filename of the rendered entry point inside a build context.
pub const ENTRYPOINT_FILENAME: &str = "main.rs";

/// Name of the compiled engine binary inside the image.
pub const BINARY_NAME: &str = "report-engine";

/// Label attached to built images, holding the build context digest.
pub const CONTEXT_LABEL: &str = "reportbox.context";

/// Extension of exported image archives.
pub const ARCHIVE_EXTENSION: &str = "tar";

pub const DEFAULT_RUNTIME: &str = "docker";
pub const DEFAULT_BASE_IMAGE: &str = "rust:1-slim";
pub const DEFAULT_RUNTIME_IMAGE: &str = "debian:bookworm-slim";
