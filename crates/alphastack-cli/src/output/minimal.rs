use serde_json::{Map, Value};

/// Print just the headline number or label.
///
/// Looks for well-known result fields in priority order, first at the top of
/// the result and then inside a nested `valuation`.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        if let Some(text) = headline(map) {
            println!("{}", text);
            return;
        }
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    if let Value::Array(arr) = result_obj {
        for item in arr {
            match item.get("id") {
                Some(id) => println!("{}", format_minimal(id)),
                None => println!("{}", format_minimal(item)),
            }
        }
        return;
    }

    println!("{}", format_minimal(result_obj));
}

fn headline(map: &Map<String, Value>) -> Option<String> {
    let priority_keys = [
        "intrinsic_value_per_share",
        "simulated_current_price",
        "verdict",
        "equity_value",
        "enterprise_value",
    ];

    for key in &priority_keys {
        if let Some(val) = map.get(*key) {
            if !val.is_null() {
                return Some(format_minimal(val));
            }
        }
    }

    match map.get("valuation") {
        Some(Value::Object(inner)) => headline(inner),
        _ => None,
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
