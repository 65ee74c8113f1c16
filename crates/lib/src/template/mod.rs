//! Template parsing and rendering for generated build artifacts.
//!
//! Templates use a small mustache-like syntax:
//!
//! - `{{name}}` - the scalar parameter `name`
//! - `{{#name}}...{{/name}}` - the body repeated once per item of list parameter `name`
//! - `{{.}}` - the current item inside a section
//!
//! Sections do not nest. Everything else passes through unchanged, so shell
//! variables, Dockerfile `${ARG}` references and Rust format strings need no
//! escaping.
//!
//! # Example
//!
//! ```
//! use reportbox_lib::template::{Params, render_str};
//!
//! let params = Params::new().text("image", "rust:1-slim").list("files", ["a.rs", "b.rs"]);
//! let out = render_str("FROM {{image}}\n{{#files}}COPY {{.}}\n{{/files}}", &params).unwrap();
//! assert_eq!(out, "FROM rust:1-slim\nCOPY a.rs\nCOPY b.rs\n");
//! ```

mod templates;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub use templates::{DOCKERFILE_TEMPLATE, ENTRYPOINT_TEMPLATE};

/// Name of the build descriptor template.
pub const DOCKERFILE: &str = "dockerfile";

/// Name of the entry-point template.
pub const ENTRYPOINT: &str = "entrypoint";

/// Override filenames looked up by [`TemplateSet::from_dir`].
const OVERRIDE_FILES: &[(&str, &str)] = &[(DOCKERFILE, "Dockerfile.tmpl"), (ENTRYPOINT, "main.rs.tmpl")];

/// A segment of parsed template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text copied to the output
  Literal(String),

  /// `{{name}}` - a scalar parameter
  Var(String),

  /// `{{.}}` - the current section item
  Item,

  /// `{{#name}}...{{/name}}` - body repeated per list item
  Section { name: String, body: Vec<Segment> },
}

/// A template parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  Text(String),
  List(Vec<String>),
}

/// Named parameters supplied to a render call.
#[derive(Debug, Clone, Default)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a scalar parameter.
  pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
    self.0.insert(name.to_string(), Value::Text(value.into()));
    self
  }

  /// Add a list parameter.
  pub fn list<I, S>(mut self, name: &str, items: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self
      .0
      .insert(name.to_string(), Value::List(items.into_iter().map(Into::into).collect()));
    self
  }

  pub fn get(&self, name: &str) -> Option<&Value> {
    self.0.get(name)
  }
}

/// Errors that can occur while loading, parsing, or rendering templates.
#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("template not found: {0}")]
  NotFound(String),

  #[error("missing template parameter: {0}")]
  MissingParameter(String),

  #[error("parameter '{0}' is a list, expected a single value")]
  NotAScalar(String),

  #[error("parameter '{0}' is a single value, expected a list")]
  NotAList(String),

  #[error("unclosed tag at position {0}")]
  Unclosed(usize),

  #[error("malformed tag '{tag}' at position {position}")]
  Malformed { tag: String, position: usize },

  #[error("section '{name}' opened at position {position} is never closed")]
  UnclosedSection { name: String, position: usize },

  #[error("section '{name}' at position {position} is nested inside another section")]
  NestedSection { name: String, position: usize },

  #[error("closing tag '{found}' at position {position} does not match open section '{expected}'")]
  MismatchedSection {
    expected: String,
    found: String,
    position: usize,
  },

  #[error("closing tag '{name}' at position {position} has no open section")]
  UnexpectedClose { name: String, position: usize },

  #[error("'{{{{.}}}}' at position {0} is only valid inside a section")]
  ItemOutsideSection(usize),

  #[error("failed to read template {}: {source}", path.display())]
  ReadFile { path: PathBuf, source: std::io::Error },
}

/// A section that has been opened but not yet closed.
struct OpenSection {
  name: String,
  position: usize,
  body: Vec<Segment>,
}

fn current<'a>(section: &'a mut Option<OpenSection>, root: &'a mut Vec<Segment>) -> &'a mut Vec<Segment> {
  match section {
    Some(open) => &mut open.body,
    None => root,
  }
}

fn is_identifier(name: &str) -> bool {
  !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse template text into segments.
///
/// # Errors
///
/// Returns an error for unclosed or malformed tags, unbalanced or nested
/// sections, and `{{.}}` used outside a section.
pub fn parse(input: &str) -> Result<Vec<Segment>, TemplateError> {
  let mut root = Vec::new();
  let mut section: Option<OpenSection> = None;
  let mut literal = String::new();
  let mut rest = input;
  let mut offset = 0;

  while let Some(start) = rest.find("{{") {
    let position = offset + start;
    literal.push_str(&rest[..start]);

    let after = &rest[start + 2..];
    let end = after.find("}}").ok_or(TemplateError::Unclosed(position))?;
    let tag = after[..end].trim();

    if !literal.is_empty() {
      current(&mut section, &mut root).push(Segment::Literal(std::mem::take(&mut literal)));
    }

    if let Some(name) = tag.strip_prefix('#') {
      let name = name.trim();
      if !is_identifier(name) {
        return Err(TemplateError::Malformed {
          tag: tag.to_string(),
          position,
        });
      }
      if section.is_some() {
        return Err(TemplateError::NestedSection {
          name: name.to_string(),
          position,
        });
      }
      section = Some(OpenSection {
        name: name.to_string(),
        position,
        body: Vec::new(),
      });
    } else if let Some(name) = tag.strip_prefix('/') {
      let name = name.trim();
      match section.take() {
        Some(open) if open.name == name => root.push(Segment::Section {
          name: open.name,
          body: open.body,
        }),
        Some(open) => {
          return Err(TemplateError::MismatchedSection {
            expected: open.name,
            found: name.to_string(),
            position,
          });
        }
        None => {
          return Err(TemplateError::UnexpectedClose {
            name: name.to_string(),
            position,
          });
        }
      }
    } else if tag == "." {
      if section.is_none() {
        return Err(TemplateError::ItemOutsideSection(position));
      }
      current(&mut section, &mut root).push(Segment::Item);
    } else if is_identifier(tag) {
      current(&mut section, &mut root).push(Segment::Var(tag.to_string()));
    } else {
      return Err(TemplateError::Malformed {
        tag: tag.to_string(),
        position,
      });
    }

    let consumed = start + 2 + end + 2;
    rest = &rest[consumed..];
    offset += consumed;
  }

  literal.push_str(rest);

  if let Some(open) = section {
    return Err(TemplateError::UnclosedSection {
      name: open.name,
      position: open.position,
    });
  }

  if !literal.is_empty() {
    root.push(Segment::Literal(literal));
  }

  Ok(root)
}

fn render_segments(
  segments: &[Segment],
  params: &Params,
  item: Option<&str>,
  out: &mut String,
) -> Result<(), TemplateError> {
  for segment in segments {
    match segment {
      Segment::Literal(text) => out.push_str(text),
      Segment::Var(name) => match params.get(name) {
        Some(Value::Text(value)) => out.push_str(value),
        Some(Value::List(_)) => return Err(TemplateError::NotAScalar(name.clone())),
        None => return Err(TemplateError::MissingParameter(name.clone())),
      },
      // parse() rejects items outside sections
      Segment::Item => out.push_str(item.unwrap_or_default()),
      Segment::Section { name, body } => match params.get(name) {
        Some(Value::List(items)) => {
          for entry in items {
            render_segments(body, params, Some(entry), out)?;
          }
        }
        Some(Value::Text(_)) => return Err(TemplateError::NotAList(name.clone())),
        None => return Err(TemplateError::MissingParameter(name.clone())),
      },
    }
  }
  Ok(())
}

/// Parse and render a template string in one step.
pub fn render_str(template: &str, params: &Params) -> Result<String, TemplateError> {
  let segments = parse(template)?;
  let mut out = String::with_capacity(template.len());
  render_segments(&segments, params, None, &mut out)?;
  Ok(out)
}

/// A named collection of templates.
#[derive(Debug, Clone)]
pub struct TemplateSet {
  templates: BTreeMap<String, String>,
}

impl TemplateSet {
  /// The embedded build descriptor and entry-point templates.
  pub fn builtin() -> Self {
    let mut templates = BTreeMap::new();
    templates.insert(DOCKERFILE.to_string(), DOCKERFILE_TEMPLATE.to_string());
    templates.insert(ENTRYPOINT.to_string(), ENTRYPOINT_TEMPLATE.to_string());
    Self { templates }
  }

  /// The built-in templates, with any `Dockerfile.tmpl` / `main.rs.tmpl`
  /// found in `dir` taking their place.
  pub fn from_dir(dir: &Path) -> Result<Self, TemplateError> {
    let mut set = Self::builtin();
    for (name, filename) in OVERRIDE_FILES {
      let path = dir.join(filename);
      if !path.is_file() {
        continue;
      }
      let source = fs::read_to_string(&path).map_err(|source| TemplateError::ReadFile {
        path: path.clone(),
        source,
      })?;
      debug!(template = %name, path = %path.display(), "using template override");
      set.insert(name, source);
    }
    Ok(set)
  }

  pub fn insert(&mut self, name: &str, source: impl Into<String>) {
    self.templates.insert(name.to_string(), source.into());
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.templates.keys().map(String::as_str)
  }

  /// Render the template registered under `name`.
  ///
  /// # Errors
  ///
  /// `TemplateError::NotFound` if no such template exists, otherwise any
  /// parse or parameter error from the template itself.
  pub fn render(&self, name: &str, params: &Params) -> Result<String, TemplateError> {
    let template = self
      .templates
      .get(name)
      .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
    render_str(template, params)
  }
}

impl Default for TemplateSet {
  fn default() -> Self {
    Self::builtin()
  }
}
