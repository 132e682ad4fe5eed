pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// Arrays that hold the per-row detail of each command's result.
const ROW_KEYS: [&str; 4] = ["breakdown", "results", "applied", "failed"];

/// The `result` object of an envelope, or the value itself.
pub(crate) fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// First non-empty row array in `result`, looking one level into `report`.
pub(crate) fn primary_rows(result: &Value) -> Option<(&str, &Vec<Value>)> {
    let map = result.as_object()?;
    let report = map.get("report").and_then(Value::as_object);
    ROW_KEYS.iter().find_map(|key| {
        map.get(*key)
            .or_else(|| report.and_then(|r| r.get(*key)))
            .and_then(Value::as_array)
            .filter(|rows| !rows.is_empty())
            .map(|rows| (*key, rows))
    })
}

/// Flatten nested objects into dotted keys: `paid.interest`, `to`, ...
pub(crate) fn flatten(prefix: &str, value: &Value, out: &mut Map<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&name, val, out);
            }
        }
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
