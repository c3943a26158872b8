//! OpenAI request to upstream payload transformation.

use antigravity_types::protocol::openai::{OpenAIContent, OpenAIMessage, OpenAIRequest};
use antigravity_types::ModelFamily;
use serde_json::{json, Value};

use super::content_parts::transform_content;
use super::generation_config::build_generation_config;
use super::tool_declarations::transform_tool_declarations;
use crate::common::ids::{derive_session_id, generate_request_id};

/// Build the complete upstream request envelope.
///
/// `model` is passed separately from the request because the dispatcher may
/// be serving the request through a fallback model.
pub fn build_request_payload(request: &OpenAIRequest, model: &str, project_id: &str) -> Value {
    let (contents, system_instruction) = transform_messages(&request.messages, model);

    let mut google_request = json!({
        "contents": contents,
        "generationConfig": build_generation_config(request, model),
    });

    if let Some(system_instruction) = system_instruction {
        google_request["systemInstruction"] = system_instruction;
    }

    if let Some(tools) = &request.tools {
        let declarations = transform_tool_declarations(tools);
        if !declarations.is_empty() {
            google_request["tools"] = json!([{ "functionDeclarations": declarations }]);
        }
    }

    google_request["sessionId"] = json!(derive_session_id(&request.messages));

    json!({
        "project": project_id,
        "model": model,
        "request": google_request,
        "userAgent": "antigravity-litellm",
        "requestId": generate_request_id(),
    })
}

fn convert_role(role: &str) -> &'static str {
    if role == "assistant" {
        "model"
    } else {
        "user"
    }
}

/// Convert the message list into Google contents plus an optional
/// `systemInstruction`.
fn transform_messages(messages: &[OpenAIMessage], model: &str) -> (Vec<Value>, Option<Value>) {
    let family = ModelFamily::from_model_name(model);

    let mut contents = Vec::new();
    let mut system_parts: Vec<Value> = Vec::new();

    for message in messages {
        match message.role.as_str() {
            "system" => {
                collect_system_parts(message, &mut system_parts);
                continue;
            },
            "tool" => {
                contents.push(transform_tool_message(message));
                continue;
            },
            _ => {},
        }

        let mut parts = match &message.content {
            Some(content) => transform_content(content, family),
            None => Vec::new(),
        };

        if let Some(tool_calls) = &message.tool_calls {
            for tool_call in tool_calls {
                let args = serde_json::from_str::<Value>(&tool_call.function.arguments)
                    .unwrap_or_else(|_| json!({}));

                let mut function_call = json!({
                    "name": tool_call.function.name,
                    "args": args,
                });
                if family.is_claude() {
                    function_call["id"] = json!(tool_call.id);
                }
                parts.push(json!({"functionCall": function_call}));
            }
        }

        // Upstream rejects empty parts arrays
        if parts.is_empty() {
            parts.push(json!({"text": "."}));
        }

        contents.push(json!({"role": convert_role(&message.role), "parts": parts}));
    }

    let system_instruction =
        (!system_parts.is_empty()).then(|| json!({"parts": system_parts}));
    (contents, system_instruction)
}

fn collect_system_parts(message: &OpenAIMessage, system_parts: &mut Vec<Value>) {
    match &message.content {
        Some(OpenAIContent::Text(text)) => system_parts.push(json!({"text": text})),
        Some(OpenAIContent::Parts(blocks)) => {
            for block in blocks {
                if block.get("type").and_then(Value::as_str) == Some("text") {
                    let text = block.get("text").and_then(Value::as_str).unwrap_or("");
                    system_parts.push(json!({"text": text}));
                }
            }
        },
        None => {},
    }
}

fn transform_tool_message(message: &OpenAIMessage) -> Value {
    let tool_call_id = message.tool_call_id.as_deref().unwrap_or("unknown");
    let result = match &message.content {
        Some(OpenAIContent::Text(text)) => text.clone(),
        Some(OpenAIContent::Parts(blocks)) => {
            serde_json::to_string(blocks).unwrap_or_default()
        },
        None => String::new(),
    };

    json!({
        "role": "user",
        "parts": [{
            "functionResponse": {
                "name": tool_call_id,
                "response": { "result": result },
            }
        }]
    })
}
