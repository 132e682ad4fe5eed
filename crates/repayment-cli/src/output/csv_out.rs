use serde_json::{Map, Value};
use std::io;

use super::{flatten, format_scalar, primary_rows, result_of};

/// Write output as CSV to stdout.
///
/// Commands with per-row detail (allocation breakdown, replayed transactions,
/// reconciled loans) print one row per entry; anything else is printed as
/// field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let result = result_of(value);

    if let Some((_, rows)) = primary_rows(result) {
        write_rows(&mut wtr, rows);
    } else {
        let mut flat = Map::new();
        flatten("", result, &mut flat);
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in &flat {
            let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
        }
    }

    let _ = wtr.flush();
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    let flat_rows: Vec<Map<String, Value>> = rows
        .iter()
        .map(|row| {
            let mut flat = Map::new();
            flatten("", row, &mut flat);
            flat
        })
        .collect();

    // Headers from the first row; later rows may omit optional fields.
    let Some(first) = flat_rows.first() else {
        return;
    };
    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for flat in &flat_rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| flat.get(*h).map(format_scalar).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&record);
    }
}
