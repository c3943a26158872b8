//! JSON-Schema sanitization for tool declarations.
//!
//! The upstream's function-declaration parser accepts a restricted schema
//! dialect: metadata keywords (`$schema`, `$ref`, ...) are rejected and every
//! schema node must carry a `type`. Sanitization is idempotent.

use serde_json::{json, Value};

/// Keywords the upstream rejects outright.
const DROPPED_KEYWORDS: [&str; 7] =
    ["$schema", "$id", "$ref", "definitions", "$defs", "examples", "default"];

/// Sanitize a JSON Schema in place for tool-declaration consumption.
///
/// Non-object schemas are replaced with `{"type": "object"}`. Within an
/// object: the dropped keywords are removed, `properties` values and `items`
/// are sanitized recursively, `additionalProperties` survives only as a
/// nested schema or literal `false`, and a missing `type` defaults to
/// `"object"`.
pub fn sanitize_schema(schema: &mut Value) {
    if !schema.is_object() {
        *schema = json!({"type": "object"});
        return;
    }

    let Some(obj) = schema.as_object_mut() else {
        return;
    };

    for keyword in DROPPED_KEYWORDS {
        obj.remove(keyword);
    }

    let mut dropped_keys: Vec<String> = Vec::new();
    for (key, value) in obj.iter_mut() {
        match key.as_str() {
            "properties" => {
                if let Some(props) = value.as_object_mut() {
                    for prop_schema in props.values_mut() {
                        sanitize_schema(prop_schema);
                    }
                }
            },
            "additionalProperties" => {
                if value.is_object() {
                    sanitize_schema(value);
                } else if *value != Value::Bool(false) {
                    dropped_keys.push(key.clone());
                }
            },
            _ => {
                if value.is_object() {
                    sanitize_schema(value);
                }
            },
        }
    }
    for key in dropped_keys {
        obj.remove(&key);
    }

    if !obj.contains_key("type") {
        obj.insert("type".to_string(), json!("object"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_metadata_keywords() {
        let mut schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "$id": "https://example.com/tool.json",
            "type": "object",
            "default": {},
            "examples": [{}],
            "properties": {
                "city": {"type": "string", "default": "Oslo"}
            }
        });

        sanitize_schema(&mut schema);

        assert!(schema.get("$schema").is_none());
        assert!(schema.get("$id").is_none());
        assert!(schema.get("default").is_none());
        assert!(schema.get("examples").is_none());
        assert!(schema["properties"]["city"].get("default").is_none());
        assert_eq!(schema["properties"]["city"]["type"], "string");
    }

    #[test]
    fn test_injects_object_type() {
        let mut schema = json!({"properties": {"x": {}}});
        sanitize_schema(&mut schema);

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["x"]["type"], "object");
    }

    #[test]
    fn test_non_object_becomes_object() {
        let mut schema = json!("not a schema");
        sanitize_schema(&mut schema);
        assert_eq!(schema, json!({"type": "object"}));
    }

    #[test]
    fn test_additional_properties_handling() {
        let mut schema = json!({
            "type": "object",
            "additionalProperties": {"$ref": "#/$defs/Extra", "type": "string"}
        });
        sanitize_schema(&mut schema);
        assert_eq!(schema["additionalProperties"], json!({"type": "string"}));

        let mut forbidden = json!({"type": "object", "additionalProperties": false});
        sanitize_schema(&mut forbidden);
        assert_eq!(forbidden["additionalProperties"], json!(false));

        let mut permissive = json!({"type": "object", "additionalProperties": true});
        sanitize_schema(&mut permissive);
        assert!(permissive.get("additionalProperties").is_none());
    }

    #[test]
    fn test_items_recursion() {
        let mut schema = json!({
            "type": "array",
            "items": {"$ref": "#/$defs/Item", "properties": {"n": {"type": "number"}}}
        });
        sanitize_schema(&mut schema);

        assert!(schema["items"].get("$ref").is_none());
        assert_eq!(schema["items"]["type"], "object");
        assert_eq!(schema["items"]["properties"]["n"]["type"], "number");
    }

    #[test]
    fn test_sanitization_is_idempotent() {
        let mut schema = json!({
            "$defs": {"T": {"type": "string"}},
            "properties": {
                "a": {"type": "string", "examples": ["x"]},
                "b": {"items": {"default": 1}}
            },
            "additionalProperties": true
        });

        sanitize_schema(&mut schema);
        let first_pass = schema.clone();
        sanitize_schema(&mut schema);
        assert_eq!(schema, first_pass);
    }
}
