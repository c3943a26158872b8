//! Content-block conversion to Google parts.

use antigravity_types::protocol::openai::{ContentBlock, OpenAIContent};
use antigravity_types::ModelFamily;
use serde_json::{json, Value};

use crate::config::MIN_SIGNATURE_LENGTH;

/// Convert a message's content into Google parts.
pub fn transform_content(content: &OpenAIContent, family: ModelFamily) -> Vec<Value> {
    match content {
        OpenAIContent::Text(text) => {
            if text.is_empty() {
                Vec::new()
            } else {
                vec![json!({"text": text})]
            }
        },
        OpenAIContent::Parts(blocks) => {
            blocks.iter().filter_map(|block| transform_content_block(block, family)).collect()
        },
    }
}

/// Convert a single content block.
///
/// Blocks are parsed lazily: a block that does not match any known variant
/// falls through to its JSON stringification so unknown client extensions
/// degrade to text instead of failing the request.
pub fn transform_content_block(raw: &Value, family: ModelFamily) -> Option<Value> {
    if raw.is_null() {
        return None;
    }

    let block = match serde_json::from_value::<ContentBlock>(raw.clone()) {
        Ok(block) => block,
        Err(_) => return Some(json!({"text": raw.to_string()})),
    };

    match block {
        ContentBlock::Text { text } => {
            if text.trim().is_empty() {
                None
            } else {
                Some(json!({"text": text}))
            }
        },

        ContentBlock::Image { source } => {
            let mime_type = source.media_type.as_deref().unwrap_or("image/jpeg");
            match source.r#type.as_str() {
                "base64" => Some(json!({
                    "inlineData": {
                        "mimeType": mime_type,
                        "data": source.data.unwrap_or_default(),
                    }
                })),
                "url" => Some(json!({
                    "fileData": {
                        "mimeType": mime_type,
                        "fileUri": source.url.unwrap_or_default(),
                    }
                })),
                _ => None,
            }
        },

        ContentBlock::ImageUrl { image_url } => transform_image_url(&image_url.url),

        ContentBlock::ToolUse { id, name, input, thought_signature } => {
            let mut function_call = json!({
                "name": name,
                "args": input,
            });
            if family.is_claude() {
                if let Some(id) = id.filter(|id| !id.is_empty()) {
                    function_call["id"] = json!(id);
                }
            }

            let mut part = json!({"functionCall": function_call});
            if family.is_gemini() {
                if let Some(signature) = thought_signature {
                    part["thoughtSignature"] = json!(signature);
                }
            }
            Some(part)
        },

        ContentBlock::ToolResult { tool_use_id, content } => {
            let response = match content {
                Value::String(result) => json!({"result": result}),
                Value::Array(items) => {
                    let joined = items
                        .iter()
                        .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
                        .filter_map(|item| item.get("text").and_then(Value::as_str))
                        .collect::<Vec<_>>()
                        .join("\n");
                    json!({"result": joined})
                },
                other => other,
            };

            let mut function_response = json!({
                "name": tool_use_id,
                "response": response,
            });
            if family.is_claude() {
                function_response["id"] = json!(tool_use_id);
            }
            Some(json!({"functionResponse": function_response}))
        },

        ContentBlock::Thinking { thinking, signature } => {
            // Unsigned or short-signed thinking cannot be replayed upstream
            if signature.len() >= MIN_SIGNATURE_LENGTH {
                Some(json!({
                    "text": thinking,
                    "thought": true,
                    "thoughtSignature": signature,
                }))
            } else {
                None
            }
        },
    }
}

fn transform_image_url(url: &str) -> Option<Value> {
    if let Some(rest) = url.strip_prefix("data:") {
        let (header, data) = rest.split_once(',')?;
        let mime_type = header.split(';').next().unwrap_or("image/jpeg");
        Some(json!({
            "inlineData": { "mimeType": mime_type, "data": data }
        }))
    } else {
        Some(json!({
            "fileData": { "mimeType": "image/jpeg", "fileUri": url }
        }))
    }
}
