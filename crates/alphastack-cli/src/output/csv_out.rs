use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
///
/// Objects become `field,value` rows with nested keys joined by dots
/// (`valuation.projection.0.discounted`); top-level arrays become one row
/// per element.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let body = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match body {
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        Value::Object(_) => {
            let _ = wtr.write_record(["field", "value"]);
            let mut rows = Vec::new();
            flatten("", body, &mut rows);
            for (key, val) in rows {
                let _ = wtr.write_record([key.as_str(), val.as_str()]);
            }
        }
        other => {
            let _ = wtr.write_record([&super::scalar_text(other)]);
        }
    }

    let _ = wtr.flush();
}

fn flatten(prefix: &str, value: &Value, rows: &mut Vec<(String, String)>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", prefix, key)
        }
    };
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                flatten(&join(key), val, rows);
            }
        }
        Value::Array(arr) => {
            for (i, val) in arr.iter().enumerate() {
                flatten(&join(&i.to_string()), val, rows);
            }
        }
        other => rows.push((prefix.to_string(), super::scalar_text(other))),
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(super::scalar_text).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&super::scalar_text(item)]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_keys() {
        let mut rows = Vec::new();
        flatten(
            "",
            &json!({"valuation": {"projection": [{"year": 1, "discounted": "120"}]}, "verdict": "Undervalued"}),
            &mut rows,
        );
        assert!(rows.contains(&("valuation.projection.0.year".to_string(), "1".to_string())));
        assert!(rows.contains(&(
            "valuation.projection.0.discounted".to_string(),
            "120".to_string()
        )));
        assert!(rows.contains(&("verdict".to_string(), "Undervalued".to_string())));
    }
}
