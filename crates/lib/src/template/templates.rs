//! Built-in template content embedded at compile time.

/// Template for the container build descriptor (Dockerfile).
pub const DOCKERFILE_TEMPLATE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets/Dockerfile.tmpl"));

/// Template for the generated entry point (`main.rs`).
pub const ENTRYPOINT_TEMPLATE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets/main.rs.tmpl"));
