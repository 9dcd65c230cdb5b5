use serde_json::{Map, Value};
use std::io;

use super::{scalar_text, ROW_FIELDS};

/// Write output as CSV to stdout.
///
/// Results carrying rows (a schedule, checks, scenarios) are written one
/// row per line; anything else becomes a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => match row_field(map) {
            Some(rows) => write_rows(&mut wtr, rows),
            None => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &scalar_text(val)]);
                }
            }
        },
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&scalar_text(result)]);
        }
    }

    let _ = wtr.flush();
}

fn row_field(map: &Map<String, Value>) -> Option<&Vec<Value>> {
    ROW_FIELDS
        .iter()
        .find_map(|f| map.get(*f).and_then(Value::as_array))
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            let _ = wtr.write_record([&scalar_text(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(scalar_text).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
