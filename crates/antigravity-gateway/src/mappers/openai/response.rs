//! Upstream response to OpenAI completion transformation.

use antigravity_types::protocol::gemini::GeminiUsageMetadata;
use antigravity_types::protocol::openai::{
    Choice, OpenAIContent, OpenAIMessage, OpenAIResponse, OpenAIUsage, ToolCall, ToolFunction,
};
use serde_json::Value;

use crate::common::ids::{generate_completion_id, generate_tool_call_id};

/// Convert an upstream generateContent response into an OpenAI completion.
///
/// The upstream may or may not wrap the payload in an outer `response`
/// envelope; both forms are accepted.
pub fn transform_google_response(google_response: &Value, model: &str) -> OpenAIResponse {
    let response = google_response.get("response").unwrap_or(google_response);

    let first_candidate = response
        .get("candidates")
        .and_then(|candidates| candidates.get(0))
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));

    let empty = Vec::new();
    let parts = first_candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let mut text_content = String::new();
    let mut reasoning_content = String::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();

    for part in parts {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            if part.get("thought").and_then(Value::as_bool).unwrap_or(false) {
                reasoning_content.push_str(text);
            } else {
                text_content.push_str(text);
            }
        } else if let Some(function_call) = part.get("functionCall") {
            let id = function_call
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(generate_tool_call_id);
            let name =
                function_call.get("name").and_then(Value::as_str).unwrap_or("").to_string();
            let args =
                function_call.get("args").cloned().unwrap_or_else(|| Value::Object(Default::default()));

            tool_calls.push(ToolCall {
                id,
                r#type: "function".to_string(),
                function: ToolFunction { name, arguments: args.to_string() },
            });
        }
    }

    let finish_reason =
        map_finish_reason(first_candidate.get("finishReason").and_then(Value::as_str), !tool_calls.is_empty());

    let usage_metadata: GeminiUsageMetadata = response
        .get("usageMetadata")
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default();

    let prompt_tokens = usage_metadata
        .prompt_token_count
        .saturating_sub(usage_metadata.cached_content_token_count);
    let completion_tokens = usage_metadata.candidates_token_count;

    let message = OpenAIMessage {
        role: "assistant".to_string(),
        content: (!text_content.is_empty()).then(|| OpenAIContent::Text(text_content)),
        reasoning_content: (!reasoning_content.is_empty()).then_some(reasoning_content),
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        tool_call_id: None,
        name: None,
    };

    OpenAIResponse {
        id: generate_completion_id(),
        object: "chat.completion".to_string(),
        created: chrono::Utc::now().timestamp().max(0) as u64,
        model: model.to_string(),
        choices: vec![Choice { index: 0, message, finish_reason: Some(finish_reason) }],
        usage: OpenAIUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        },
    }
}

fn map_finish_reason(finish_reason: Option<&str>, has_tool_calls: bool) -> String {
    match finish_reason.unwrap_or("STOP") {
        "STOP" => "stop",
        "MAX_TOKENS" => "length",
        "TOOL_USE" => "tool_calls",
        _ if has_tool_calls => "tool_calls",
        _ => "stop",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_response() {
        let google = json!({
            "response": {
                "candidates": [{
                    "content": {"parts": [{"text": "Hello "}, {"text": "world"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4}
            }
        });

        let response = transform_google_response(&google, "gemini-3-flash");

        assert!(response.id.starts_with("chatcmpl-"));
        assert_eq!(response.object, "chat.completion");
        assert_eq!(response.model, "gemini-3-flash");
        assert_eq!(response.choices.len(), 1);
        assert_eq!(response.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(
            response.choices[0].message.content,
            Some(OpenAIContent::Text("Hello world".to_string()))
        );
        assert_eq!(response.usage.prompt_tokens, 10);
        assert_eq!(response.usage.completion_tokens, 4);
        assert_eq!(response.usage.total_tokens, 14);
    }

    #[test]
    fn test_unwrapped_payload_accepted() {
        let google = json!({
            "candidates": [{"content": {"parts": [{"text": "direct"}]}}],
            "usageMetadata": {}
        });

        let response = transform_google_response(&google, "gemini-3-flash");
        assert_eq!(
            response.choices[0].message.content,
            Some(OpenAIContent::Text("direct".to_string()))
        );
    }

    #[test]
    fn test_thought_parts_surface_as_reasoning() {
        let google = json!({
            "response": {
                "candidates": [{
                    "content": {"parts": [
                        {"text": "pondering...", "thought": true, "thoughtSignature": "sig"},
                        {"text": "the answer"}
                    ]},
                    "finishReason": "STOP"
                }]
            }
        });

        let response = transform_google_response(&google, "claude-opus-4.5-thinking");
        let message = &response.choices[0].message;
        assert_eq!(message.reasoning_content.as_deref(), Some("pondering..."));
        assert_eq!(message.content, Some(OpenAIContent::Text("the answer".to_string())));
    }

    #[test]
    fn test_function_call_becomes_tool_call() {
        let google = json!({
            "response": {
                "candidates": [{
                    "content": {"parts": [
                        {"functionCall": {"name": "get_weather", "args": {"city": "Oslo"}}}
                    ]},
                    "finishReason": "STOP"
                }]
            }
        });

        let response = transform_google_response(&google, "gemini-3-flash");
        let message = &response.choices[0].message;

        // No text parts and tool calls present -> content is null
        assert_eq!(message.content, None);
        let calls = message.tool_calls.as_ref().expect("tool calls");
        assert_eq!(calls[0].function.name, "get_weather");
        assert!(calls[0].id.starts_with("call_"));
        assert_eq!(calls[0].id.len(), "call_".len() + 24);
        // Arguments are JSON-encoded
        let args: Value = serde_json::from_str(&calls[0].function.arguments).expect("args");
        assert_eq!(args["city"], "Oslo");
    }

    #[test]
    fn test_provided_tool_call_id_preserved() {
        let google = json!({
            "candidates": [{
                "content": {"parts": [
                    {"functionCall": {"id": "call_upstream", "name": "noop", "args": {}}}
                ]}
            }]
        });

        let response = transform_google_response(&google, "claude-sonnet-4.5");
        let calls = response.choices[0].message.tool_calls.as_ref().expect("calls");
        assert_eq!(calls[0].id, "call_upstream");
    }

    #[test]
    fn test_finish_reason_mapping() {
        let base = |reason: &str| {
            json!({
                "candidates": [{
                    "content": {"parts": [{"text": "x"}]},
                    "finishReason": reason
                }]
            })
        };

        let stop = transform_google_response(&base("STOP"), "m");
        assert_eq!(stop.choices[0].finish_reason.as_deref(), Some("stop"));

        let length = transform_google_response(&base("MAX_TOKENS"), "m");
        assert_eq!(length.choices[0].finish_reason.as_deref(), Some("length"));

        let tool_use = transform_google_response(&base("TOOL_USE"), "m");
        assert_eq!(tool_use.choices[0].finish_reason.as_deref(), Some("tool_calls"));

        let other = transform_google_response(&base("SAFETY"), "m");
        assert_eq!(other.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_cached_tokens_subtracted_from_prompt() {
        let google = json!({
            "response": {
                "candidates": [{"content": {"parts": [{"text": "x"}]}}],
                "usageMetadata": {
                    "promptTokenCount": 100,
                    "cachedContentTokenCount": 30,
                    "candidatesTokenCount": 20
                }
            }
        });

        let response = transform_google_response(&google, "m");
        assert_eq!(response.usage.prompt_tokens, 70);
        assert_eq!(response.usage.completion_tokens, 20);
        assert_eq!(response.usage.total_tokens, 90);
    }

    #[test]
    fn test_empty_candidates_yield_empty_completion() {
        let google = json!({"response": {"candidates": []}});
        let response = transform_google_response(&google, "m");

        assert_eq!(response.choices[0].message.content, None);
        assert_eq!(response.choices[0].message.tool_calls, None);
        assert_eq!(response.choices[0].finish_reason.as_deref(), Some("stop"));
    }
}
