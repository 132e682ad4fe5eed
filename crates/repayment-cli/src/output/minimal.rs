use serde_json::Value;

use super::{format_scalar, result_of};

/// Print a one-line answer for each command.
///
/// Allocation prints the amount left over, paid-status the status code,
/// and batch commands a count summary.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    if let Some(summary) = summarize(result) {
        println!("{}", summary);
        return;
    }

    let priority_keys = ["remaining_amount", "status_code", "status"];
    if let Value::Object(map) = result {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_scalar(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(result));
}

fn summarize(result: &Value) -> Option<String> {
    let map = result.as_object()?;
    let count = |v: Option<&Value>| v.and_then(Value::as_array).map_or(0, Vec::len);

    if let Some(report) = map.get("report").and_then(Value::as_object) {
        return Some(format!(
            "applied={} skipped={} failed={} notifications={}",
            count(report.get("applied")),
            count(report.get("skipped")),
            count(report.get("failed")),
            report.get("notifications").map(format_scalar).unwrap_or_default(),
        ));
    }

    let results = map.get("results")?.as_array()?;
    let rejected = results.iter().filter(|r| r.get("error").is_some()).count();
    Some(format!(
        "processed={} rejected={} effects={} alerts={}",
        results.len() - rejected,
        rejected,
        count(map.get("dispatched_effects")),
        count(map.get("operator_alerts")),
    ))
}
