//! JSON-LD blocks embedded in `<script type="application/ld+json">`.

use scraper::{Html, Selector};
use serde_json::{Map, Value};

pub(crate) type Object = Map<String, Value>;

/// Every JSON-LD object on the page, arrays and `@graph` flattened, in
/// document order. Unparsable blocks are skipped.
pub(crate) fn collect(doc: &Html) -> Vec<Object> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for script in doc.select(&selector) {
        let raw = script.text().collect::<String>();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            flatten(value, &mut out);
        }
    }
    out
}

fn flatten(value: Value, out: &mut Vec<Object>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten(item, out);
            }
        }
        Value::Object(mut obj) => match obj.remove("@graph") {
            Some(graph) => flatten(graph, out),
            None => out.push(obj),
        },
        _ => {}
    }
}

/// Whether `@type` names `name` (string or array form).
pub(crate) fn has_type(obj: &Object, name: &str) -> bool {
    match obj.get("@type") {
        Some(Value::String(t)) => t == name,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(name)),
        _ => false,
    }
}

/// String value of `key`, trimmed and non-empty.
pub(crate) fn string(obj: &Object, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Number stored as a JSON number or a numeric string.
pub(crate) fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// One or many values as a list.
pub(crate) fn many(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
        None => Vec::new(),
    }
}
