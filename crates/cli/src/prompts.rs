//! Interactive configuration prompts.
//!
//! Prompting is driven entirely by a schema's field list: each field is asked
//! for once, in order, and the answer is parsed according to its declared
//! type. Empty answers take the field's default or skip an optional field.

use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use serde_json::{Map, Value};

use reportbox_lib::schema::{Field, FieldSchema, FieldType};

fn describe(field: &Field) -> String {
  let kind = if matches!(field.field_type, FieldType::StringList | FieldType::NumberList) {
    format!("{}, comma-separated", field.field_type)
  } else {
    field.field_type.to_string()
  };
  let mut label = format!("{} ({})", field.name, kind);
  if let Some(default) = &field.default {
    label.push_str(&format!(" [{}]", default));
  } else if !field.is_required() {
    label.push_str(" [optional]");
  }
  label
}

/// Ask for every field of `schema` on `output`, reading answers from `input`.
pub fn prompt_config<R: BufRead, W: Write>(schema: &FieldSchema, input: &mut R, output: &mut W) -> Result<Value> {
  let mut config = Map::new();

  for field in &schema.fields {
    if let Some(description) = &field.description {
      writeln!(output, "{}", description)?;
    }
    loop {
      write!(output, "{}: ", describe(field))?;
      output.flush()?;

      let mut line = String::new();
      if input.read_line(&mut line)? == 0 {
        bail!("Input ended before '{}' was answered", field.name);
      }
      let answer = line.trim();

      if answer.is_empty() {
        if let Some(default) = &field.default {
          config.insert(field.name.clone(), default.clone());
          break;
        }
        if !field.is_required() {
          break;
        }
        writeln!(output, "  {} is required", field.name)?;
        continue;
      }

      match field.parse_input(answer) {
        Ok(value) => {
          config.insert(field.name.clone(), value);
          break;
        }
        Err(message) => writeln!(output, "  {}", message)?,
      }
    }
  }

  Ok(Value::Object(config))
}
