use serde_json::Value;

use super::cell;

/// Result fields worth printing on their own, most important first.
const PRIORITY_KEYS: [&str; 4] = [
    "monthly_repayment",
    "interest_saved",
    "months_saved",
    "year",
];

/// Print just the headline number from the output.
///
/// Looks for the priority fields in the result envelope, then falls back to
/// the first field. Arrays (trajectory, sensitivity results) print their
/// last row.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result").or_else(|| m.get("results")))
        .unwrap_or(value);

    let target = match result_obj {
        Value::Array(rows) => rows.last().unwrap_or(result_obj),
        other => other,
    };

    if let Value::Object(map) = target {
        for key in &PRIORITY_KEYS {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", cell(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, cell(val));
            return;
        }
    }

    println!("{}", cell(target));
}
