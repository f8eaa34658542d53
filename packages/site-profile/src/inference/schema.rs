//! Strict-mode JSON schemas for phase payloads.
//!
//! OpenAI-style strict structured output requires:
//! 1. `additionalProperties: false` on every object
//! 2. every property listed in `required`, nullable ones included
//! 3. no `$ref` (definitions fully inlined)
//!
//! `schemars` output is rewritten to meet those rules, and unsupported
//! keywords (`format`, numeric bounds) are dropped.

use schemars::{schema_for, JsonSchema};
use serde_json::{json, Map, Value};

/// Keywords the strict validator rejects or ignores.
const UNSUPPORTED_KEYWORDS: &[&str] = &["format", "minimum", "maximum", "default", "$schema", "title"];

/// Inlining stops here; payload types are shallow.
const MAX_INLINE_DEPTH: usize = 16;

/// Strict schema for `T`, without the confidence field.
pub fn strict_schema<T: JsonSchema>() -> Value {
    let mut value = serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| json!({}));

    let definitions = match &mut value {
        Value::Object(map) => map.remove("definitions").unwrap_or(Value::Null),
        _ => Value::Null,
    };

    inline_refs(&mut value, &definitions, 0);
    normalize(&mut value);
    value
}

/// Strict schema for `T` with a root-level `confidence` number.
///
/// Every phase asks the model to self-report confidence next to its data.
pub fn phase_schema<T: JsonSchema>() -> Value {
    let mut schema = strict_schema::<T>();
    add_confidence(&mut schema);
    schema
}

fn add_confidence(schema: &mut Value) {
    let Value::Object(root) = schema else {
        return;
    };

    let properties = root
        .entry("properties")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(props) = properties {
        props.insert(
            "confidence".to_string(),
            json!({
                "type": "number",
                "description": "How sure you are that the extracted data is correct and complete, from 0.0 to 1.0"
            }),
        );
    }

    let required = root
        .entry("required")
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(items) = required {
        let key = Value::String("confidence".to_string());
        if !items.contains(&key) {
            items.push(key);
        }
    }

    root.insert("type".to_string(), Value::String("object".to_string()));
    root.insert("additionalProperties".to_string(), Value::Bool(false));
}

fn inline_refs(value: &mut Value, definitions: &Value, depth: usize) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(path)) = map.get("$ref") {
                let name = path.trim_start_matches("#/definitions/");
                if depth < MAX_INLINE_DEPTH {
                    if let Some(def) = definitions.get(name) {
                        let mut replacement = def.clone();
                        inline_refs(&mut replacement, definitions, depth + 1);
                        map.remove("$ref");
                        if let Value::Object(def_map) = replacement {
                            for (k, v) in def_map {
                                map.entry(k).or_insert(v);
                            }
                        }
                        return;
                    }
                }
            }
            for (_, v) in map.iter_mut() {
                inline_refs(v, definitions, depth);
            }
        }
        Value::Array(items) => {
            for item in items {
                inline_refs(item, definitions, depth);
            }
        }
        _ => {}
    }
}

/// Collapse single-entry `allOf`, drop unsupported keywords and make every
/// object strict.
fn normalize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(all_of)) = map.get("allOf") {
                if all_of.len() == 1 {
                    if let Some(Value::Object(inner)) = map.remove("allOf").and_then(|v| match v {
                        Value::Array(mut items) => items.pop(),
                        _ => None,
                    }) {
                        for (k, v) in inner {
                            map.entry(k).or_insert(v);
                        }
                    }
                }
            }

            for keyword in UNSUPPORTED_KEYWORDS {
                map.remove(*keyword);
            }

            if is_object_schema(map) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
                let keys: Vec<Value> = match map.get("properties") {
                    Some(Value::Object(props)) => {
                        props.keys().map(|k| Value::String(k.clone())).collect()
                    }
                    _ => Vec::new(),
                };
                map.insert("required".to_string(), Value::Array(keys));
            }

            for (key, v) in map.iter_mut() {
                // Property names are user data, not schemas
                if key == "properties" {
                    if let Value::Object(props) = v {
                        for prop in props.values_mut() {
                            normalize(prop);
                        }
                    }
                } else {
                    normalize(v);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                normalize(item);
            }
        }
        _ => {}
    }
}

fn is_object_schema(map: &Map<String, Value>) -> bool {
    match map.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t == "object"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::profile::{ContactInfo, StructuredContent};
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct Wrapper {
        /// Documented nested field, wrapped in a composition by schemars
        contact: ContactInfo,
        note: Option<String>,
    }

    /// Fails on any schema keyword strict mode rejects. Property names and
    /// description text are not keywords and are not checked.
    fn assert_no_refs(value: &Value) {
        const FORBIDDEN: &[&str] = &["$ref", "definitions", "$defs", "allOf", "format"];

        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    assert!(!FORBIDDEN.contains(&key.as_str()), "schema still has {}: {}", key, value);
                    match (key.as_str(), child) {
                        ("properties", Value::Object(props)) => props.values().for_each(assert_no_refs),
                        _ => assert_no_refs(child),
                    }
                }
            }
            Value::Array(items) => items.iter().for_each(assert_no_refs),
            _ => {}
        }
    }

    #[test]
    fn test_keyword_check_ignores_description_text() {
        let schema = serde_json::json!({
            "type": "object",
            "description": "mentions allOf and $ref in prose",
            "properties": {"format": {"type": "string"}}
        });
        assert_no_refs(&schema);
    }

    #[test]
    fn test_nested_types_inlined() {
        let schema = strict_schema::<Wrapper>();
        assert_no_refs(&schema);

        let contact = &schema["properties"]["contact"];
        assert_eq!(contact["type"], "object");
        assert_eq!(contact["additionalProperties"], false);
        let required: Vec<&str> = contact["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"emails"));
        assert!(required.contains(&"coordinates"));
    }

    #[test]
    fn test_optional_fields_required() {
        let schema = strict_schema::<Wrapper>();
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("note")));
        assert!(required.contains(&json!("contact")));
    }

    #[test]
    fn test_phase_schema_has_confidence() {
        let schema = phase_schema::<StructuredContent>();
        assert_no_refs(&schema);
        assert_eq!(schema["properties"]["confidence"]["type"], "number");
        assert!(schema["required"]
            .as_array()
            .unwrap()
            .contains(&json!("confidence")));
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn test_array_items_are_strict() {
        let schema = strict_schema::<StructuredContent>();
        let item = &schema["properties"]["services"]["items"];
        assert_eq!(item["additionalProperties"], false);
        assert!(item["required"].as_array().unwrap().contains(&json!("price")));
    }
}
