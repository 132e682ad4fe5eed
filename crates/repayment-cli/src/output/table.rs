use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten, format_scalar, primary_rows};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_field_table(value);
            }
        }
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    // Scalar summary first, then the per-row detail.
    let mut summary = Map::new();
    if let Value::Object(res_map) = result {
        for (key, val) in res_map {
            if !matches!(val, Value::Array(_) | Value::Object(_)) {
                summary.insert(key.clone(), val.clone());
            } else if key == "total_paid" || key == "total_waived" {
                flatten(key, val, &mut summary);
            }
        }
    }
    if !summary.is_empty() {
        print_field_table(&Value::Object(summary));
    }

    if let Some((name, rows)) = primary_rows(result) {
        println!("\n{}:", name);
        print_rows_table(rows);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_field_table(value: &Value) {
    let mut flat = Map::new();
    flatten("", value, &mut flat);
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in &flat {
        builder.push_record([key.as_str(), &format_scalar(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows_table(rows: &[Value]) {
    let flat_rows: Vec<Map<String, Value>> = rows
        .iter()
        .map(|row| {
            let mut flat = Map::new();
            flatten("", row, &mut flat);
            flat
        })
        .collect();
    let Some(first) = flat_rows.first() else {
        println!("(empty)");
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for flat in &flat_rows {
        let row: Vec<String> = headers
            .iter()
            .map(|h| flat.get(h.as_str()).map(format_scalar).unwrap_or_default())
            .collect();
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}
