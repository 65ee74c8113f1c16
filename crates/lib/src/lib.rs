//! reportbox-lib: packaging and invocation of containerized report engines
//!
//! A report engine is a Rust type implementing `ReportEngine` (see
//! `assets/report_engine.rs`). This crate provides:
//! - `engine`: the descriptor naming an engine's artifacts
//! - `context`: staging of a self-contained build context
//! - `image`: building, exporting and loading images
//! - `invoke`: running a packaged engine over standard streams
//! - `schema`: declarative configuration schemas and validation

pub mod config;
pub mod consts;
pub mod context;
pub mod engine;
pub mod error;
pub mod image;
pub mod invoke;
pub mod manifest;
pub mod paths;
pub mod runtime;
pub mod schema;
pub mod template;

pub use error::{Error, ErrorKind, Result};
