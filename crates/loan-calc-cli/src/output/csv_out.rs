use serde_json::Value;
use std::io;

use super::cell;

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Row arrays (trajectory, sensitivity results) become one record per row;
/// a result envelope becomes `field,value` pairs with nested objects
/// flattened to dotted field names.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Array(rows) => write_rows(&mut wtr, rows),
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.get("results") {
                write_rows(&mut wtr, rows);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                let fields = map.get("result").unwrap_or(value);
                write_fields(&mut wtr, "", fields);
            }
        }
        _ => {
            let _ = wtr.write_record([cell(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_fields(wtr: &mut StdoutWriter<'_>, prefix: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                write_fields(wtr, &name, val);
            }
        }
        _ => {
            let _ = wtr.write_record([prefix, &cell(value)]);
        }
    }
}

fn write_rows(wtr: &mut StdoutWriter<'_>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            let _ = wtr.write_record([cell(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(cell).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
