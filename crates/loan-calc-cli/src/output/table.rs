use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::cell;

/// Format output as tables using the tabled crate.
///
/// A result envelope prints its scalar fields as one Field/Value table,
/// each nested object (display strings) as its own table, and each row
/// array (trajectory, sensitivity results) as a columnar table, followed by
/// warnings and methodology.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(result)) = map.get("result") {
                print_sections(result);
            } else {
                print_sections(map);
            }
            print_envelope_notes(map);
        }
        Value::Array(rows) => print_rows(rows),
        _ => println!("{}", value),
    }
}

fn print_sections(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut nested: Vec<(&String, &Value)> = Vec::new();

    for (key, val) in map {
        match val {
            Value::Object(_) | Value::Array(_) => nested.push((key, val)),
            _ => builder.push_record([key.as_str(), &cell(val)]),
        }
    }
    println!("{}", Table::from(builder));

    for (key, val) in nested {
        if key == "warnings" || key == "metadata" || key == "assumptions" {
            continue;
        }
        println!("\n{}:", key);
        match val {
            Value::Object(inner) => print_sections(inner),
            Value::Array(rows) => print_rows(rows),
            _ => {}
        }
    }
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            println!("{}", cell(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(cell).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
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
