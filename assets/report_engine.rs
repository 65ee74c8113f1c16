//! Interface shared by every packaged report engine.
//!
//! An engine implements `run_report`; the generated entry point calls
//! `generate_report`, which checks the configuration against the engine's
//! field schema first.

use serde_json::Value;

pub enum EngineError {
    /// The configuration does not match the schema.
    Invalid(String),
    /// The engine failed while producing the report.
    Failed(String),
}

pub trait ReportEngine {
    fn run_report(&self, config: &Value) -> Result<Vec<u8>, String>;

    fn generate_report(&self, config: &Value, schema: &str) -> Result<Vec<u8>, EngineError> {
        validate(config, schema).map_err(EngineError::Invalid)?;
        self.run_report(config).map_err(EngineError::Failed)
    }
}

/// Check `config` against a JSON field list (`{"fields": [...]}`).
pub fn validate(config: &Value, schema: &str) -> Result<(), String> {
    let schema: Value = serde_json::from_str(schema).map_err(|e| format!("unreadable schema: {e}"))?;
    let object = config
        .as_object()
        .ok_or_else(|| "configuration must be a JSON object".to_string())?;

    let mut problems = Vec::new();
    let fields = schema["fields"].as_array().cloned().unwrap_or_default();
    for field in &fields {
        let name = field["name"].as_str().unwrap_or_default();
        let kind = field["type"].as_str().unwrap_or("string");
        let required = field["required"].as_bool().unwrap_or(field.get("default").is_none());
        match object.get(name) {
            None | Some(Value::Null) if required => problems.push(format!("{name}: field required")),
            None | Some(Value::Null) => {}
            Some(value) if !matches_kind(value, kind) => problems.push(format!("{name}: expected {kind}")),
            Some(_) => {}
        }
    }

    if problems.is_empty() { Ok(()) } else { Err(problems.join("; ")) }
}

fn matches_kind(value: &Value, kind: &str) -> bool {
    match kind {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "string_list" => value.as_array().is_some_and(|items| items.iter().all(Value::is_string)),
        "number_list" => value.as_array().is_some_and(|items| items.iter().all(Value::is_number)),
        _ => false,
    }
}
