//! Tool declaration transformation for the upstream function-calling format.

use serde_json::{json, Value};

use crate::common::json_schema::sanitize_schema;

/// Transform OpenAI tool definitions into upstream function declarations.
///
/// Accepts both the wrapped form (`{"type": "function", "function": {...}}`)
/// and bare function objects, and sanitizes each parameter schema.
pub fn transform_tool_declarations(tools: &[Value]) -> Vec<Value> {
    let mut declarations = Vec::new();

    for tool in tools {
        let func = tool.get("function").unwrap_or(tool);

        let name = func.get("name").and_then(Value::as_str).unwrap_or("");
        let description = func.get("description").and_then(Value::as_str).unwrap_or("");

        let mut parameters = func
            .get("parameters")
            .or_else(|| func.get("input_schema"))
            .cloned()
            .unwrap_or_else(|| json!({"type": "object"}));
        sanitize_schema(&mut parameters);

        declarations.push(json!({
            "name": name,
            "description": description,
            "parameters": parameters,
        }));
    }

    declarations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_and_bare_forms() {
        let tools = vec![
            json!({
                "type": "function",
                "function": {
                    "name": "get_weather",
                    "description": "Current weather",
                    "parameters": {"type": "object", "properties": {"city": {"type": "string"}}}
                }
            }),
            json!({
                "name": "search",
                "input_schema": {"type": "object", "properties": {"q": {"type": "string"}}}
            }),
        ];

        let declarations = transform_tool_declarations(&tools);
        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[0]["name"], "get_weather");
        assert_eq!(declarations[1]["name"], "search");
        assert_eq!(declarations[1]["parameters"]["properties"]["q"]["type"], "string");
    }

    #[test]
    fn test_parameters_are_sanitized() {
        let tools = vec![json!({
            "function": {
                "name": "lookup",
                "parameters": {
                    "$schema": "http://json-schema.org/draft-07/schema#",
                    "properties": {"id": {"type": "string", "default": "x"}}
                }
            }
        })];

        let declarations = transform_tool_declarations(&tools);
        let params = &declarations[0]["parameters"];
        assert!(params.get("$schema").is_none());
        assert_eq!(params["type"], "object");
        assert!(params["properties"]["id"].get("default").is_none());
    }

    #[test]
    fn test_missing_schema_defaults_to_object() {
        let tools = vec![json!({"function": {"name": "ping"}})];
        let declarations = transform_tool_declarations(&tools);
        assert_eq!(declarations[0]["parameters"], json!({"type": "object"}));
        assert_eq!(declarations[0]["description"], "");
    }
}
