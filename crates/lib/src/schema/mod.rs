//! Configuration schemas.
//!
//! The packaging pipeline only needs a [`Validator`]: something that accepts
//! or rejects a configuration with details. [`FieldSchema`] is the
//! declarative implementation shipped with reportbox: a flat list of typed
//! fields, read from the same JSON file that is staged into the image. The
//! same field list drives interactive prompting in the CLI.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A configuration was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid configuration: {}", problems.join("; "))]
pub struct ValidationError {
  pub problems: Vec<String>,
}

impl ValidationError {
  pub fn single(problem: impl Into<String>) -> Self {
    Self {
      problems: vec![problem.into()],
    }
  }
}

/// Checks a configuration before any container is started.
pub trait Validator {
  fn validate(&self, config: &Value) -> Result<(), ValidationError>;
}

/// Errors raised while loading a schema file.
#[derive(Debug, Error)]
pub enum SchemaError {
  #[error("failed to read schema {}: {source}", path.display())]
  ReadFile { path: PathBuf, source: std::io::Error },

  #[error("failed to parse schema {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_json::Error },

  #[error("duplicate field '{0}' in schema")]
  DuplicateField(String),
}

/// Value type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
  String,
  Integer,
  Number,
  Boolean,
  StringList,
  NumberList,
}

impl FieldType {
  pub fn as_str(self) -> &'static str {
    match self {
      FieldType::String => "string",
      FieldType::Integer => "integer",
      FieldType::Number => "number",
      FieldType::Boolean => "boolean",
      FieldType::StringList => "string_list",
      FieldType::NumberList => "number_list",
    }
  }

  fn matches(self, value: &Value) -> bool {
    match self {
      FieldType::String => value.is_string(),
      FieldType::Integer => value.is_i64() || value.is_u64(),
      FieldType::Number => value.is_number(),
      FieldType::Boolean => value.is_boolean(),
      FieldType::StringList => value.as_array().is_some_and(|items| items.iter().all(Value::is_string)),
      FieldType::NumberList => value.as_array().is_some_and(|items| items.iter().all(Value::is_number)),
    }
  }

  fn parse_scalar(self, text: &str) -> Result<Value, String> {
    let text = text.trim();
    match self {
      FieldType::String | FieldType::StringList => Ok(Value::String(text.to_string())),
      FieldType::Integer => text
        .parse::<i64>()
        .map(Value::from)
        .map_err(|_| format!("'{text}' is not an integer")),
      FieldType::Number | FieldType::NumberList => text
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| format!("'{text}' is not a number")),
      FieldType::Boolean => match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
        "false" | "no" | "n" | "0" => Ok(Value::Bool(false)),
        _ => Err(format!("'{text}' is not a boolean")),
      },
    }
  }
}

impl fmt::Display for FieldType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One configuration field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
  pub name: String,
  #[serde(rename = "type")]
  pub field_type: FieldType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub required: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl Field {
  /// Fields are required unless marked otherwise or given a default.
  pub fn is_required(&self) -> bool {
    self.required.unwrap_or(self.default.is_none())
  }

  /// Convert prompt input into a JSON value. List fields take comma-separated items.
  pub fn parse_input(&self, text: &str) -> Result<Value, String> {
    match self.field_type {
      FieldType::StringList | FieldType::NumberList => {
        if text.trim().is_empty() {
          return Ok(Value::Array(Vec::new()));
        }
        text
          .split(',')
          .map(|item| self.field_type.parse_scalar(item))
          .collect::<Result<Vec<_>, _>>()
          .map(Value::Array)
      }
      scalar => scalar.parse_scalar(text),
    }
  }
}

/// A declarative list of configuration fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
  pub fields: Vec<Field>,
}

impl FieldSchema {
  pub fn parse(content: &str, path: &Path) -> Result<Self, SchemaError> {
    let schema: FieldSchema = serde_json::from_str(content).map_err(|source| SchemaError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    for (index, field) in schema.fields.iter().enumerate() {
      if schema.fields[..index].iter().any(|other| other.name == field.name) {
        return Err(SchemaError::DuplicateField(field.name.clone()));
      }
    }
    Ok(schema)
  }

  pub fn load(path: &Path) -> Result<Self, SchemaError> {
    let content = fs::read_to_string(path).map_err(|source| SchemaError::ReadFile {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&content, path)
  }

  pub fn field(&self, name: &str) -> Option<&Field> {
    self.fields.iter().find(|field| field.name == name)
  }

  /// Fill in defaults for absent optional fields.
  pub fn apply_defaults(&self, config: &mut Map<String, Value>) {
    for field in &self.fields {
      if let Some(default) = &field.default {
        config.entry(field.name.clone()).or_insert_with(|| default.clone());
      }
    }
  }
}

impl Validator for FieldSchema {
  fn validate(&self, config: &Value) -> Result<(), ValidationError> {
    let object = config
      .as_object()
      .ok_or_else(|| ValidationError::single("configuration must be a JSON object"))?;

    let mut problems = Vec::new();
    for field in &self.fields {
      match object.get(&field.name) {
        None | Some(Value::Null) if field.is_required() => problems.push(format!("{}: field required", field.name)),
        None | Some(Value::Null) => {}
        Some(value) if !field.field_type.matches(value) => {
          problems.push(format!("{}: expected {}", field.name, field.field_type))
        }
        Some(_) => {}
      }
    }

    if problems.is_empty() {
      Ok(())
    } else {
      Err(ValidationError { problems })
    }
  }
}
