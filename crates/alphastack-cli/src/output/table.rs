use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::scalar_text;

/// Format output as tables: scalars in a Field/Value table, nested objects
/// and row arrays (projections, stress tests, peers) as their own sections.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result, map);
            } else {
                print_section(None, map);
            }
        }
        Value::Array(arr) => print_rows(None, arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_section(None, res_map),
        Value::Array(arr) => print_rows(None, arr),
        other => println!("{}", scalar_text(other)),
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

fn print_section(title: Option<&str>, map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut scalars = 0;
    for (key, val) in map {
        if is_scalar(val) || is_scalar_list(val) {
            builder.push_record([key.as_str(), &format_value(val)]);
            scalars += 1;
        }
    }
    if scalars > 0 {
        if let Some(t) = title {
            println!("\n{}:", t);
        }
        println!("{}", Table::from(builder));
    }

    for (key, val) in map {
        let heading = match title {
            Some(t) => format!("{}.{}", t, key),
            None => key.clone(),
        };
        match val {
            Value::Object(inner) => print_section(Some(&heading), inner),
            Value::Array(arr) if !arr.is_empty() && !is_scalar_list(val) => {
                print_rows(Some(&heading), arr)
            }
            _ => {}
        }
    }
}

fn print_rows(title: Option<&str>, arr: &[Value]) {
    if let Some(t) = title {
        println!("\n{}:", t);
    }
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

fn is_scalar_list(value: &Value) -> bool {
    matches!(value, Value::Array(arr) if arr.iter().all(is_scalar))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        other => scalar_text(other),
    }
}
