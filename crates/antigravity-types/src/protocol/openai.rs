//! OpenAI ChatCompletions API types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OpenAI chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIRequest {
    /// Model identifier (e.g., "gemini-3-flash", "claude-sonnet-4.5").
    pub model: String,
    /// Conversation messages.
    #[serde(default)]
    pub messages: Vec<OpenAIMessage>,
    /// Enable streaming response.
    #[serde(default)]
    pub stream: bool,
    /// Maximum tokens in response.
    #[serde(rename = "max_tokens")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0-2.0).
    pub temperature: Option<f64>,
    /// Nucleus sampling parameter.
    #[serde(rename = "top_p")]
    pub top_p: Option<f64>,
    /// Stop sequences (string or array of strings).
    pub stop: Option<Value>,
    /// Tool definitions for function calling.
    #[serde(default)]
    pub tools: Option<Vec<Value>>,
    /// Tool choice strategy.
    #[serde(rename = "tool_choice")]
    pub tool_choice: Option<Value>,
    /// Extended-thinking parameters (Anthropic-style passthrough).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingParams>,
}

impl OpenAIRequest {
    /// Create a bare request with the given model and messages.
    pub fn new(model: impl Into<String>, messages: Vec<OpenAIMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
            max_tokens: None,
            temperature: None,
            top_p: None,
            stop: None,
            tools: None,
            tool_choice: None,
            thinking: None,
        }
    }
}

/// Extended-thinking request parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThinkingParams {
    /// Token budget for the thinking phase.
    #[serde(rename = "budget_tokens", skip_serializing_if = "Option::is_none")]
    pub budget_tokens: Option<u64>,
}

/// Content in OpenAI message (string or array of blocks).
///
/// Array elements are kept as raw JSON so that unknown block types can fall
/// through to stringification instead of failing the whole request parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OpenAIContent {
    /// Plain text content.
    Text(String),
    /// Array of content blocks, parsed lazily per block.
    Parts(Vec<Value>),
}

/// Known content block types in OpenAI/Anthropic-shaped messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// Text content block.
    #[serde(rename = "text")]
    Text {
        /// Text content.
        text: String,
    },
    /// Anthropic-style image block with a source descriptor.
    #[serde(rename = "image")]
    Image {
        /// Image source (base64 or url).
        source: ImageSource,
    },
    /// OpenAI-style image URL content block.
    #[serde(rename = "image_url")]
    ImageUrl {
        /// Image URL data.
        image_url: ImageUrl,
    },
    /// Tool invocation block on an assistant message.
    #[serde(rename = "tool_use")]
    ToolUse {
        /// Tool call identifier.
        #[serde(default)]
        id: Option<String>,
        /// Tool name.
        name: String,
        /// Tool input arguments.
        #[serde(default)]
        input: Value,
        /// Provider signature carried through Gemini replay.
        #[serde(rename = "thoughtSignature", default, skip_serializing_if = "Option::is_none")]
        thought_signature: Option<String>,
    },
    /// Tool result block on a user message.
    #[serde(rename = "tool_result")]
    ToolResult {
        /// Identifier of the tool call this result answers.
        #[serde(rename = "tool_use_id")]
        tool_use_id: String,
        /// Result payload (string or array of text blocks).
        #[serde(default)]
        content: Value,
    },
    /// Provider-signed chain-of-thought block.
    #[serde(rename = "thinking")]
    Thinking {
        /// Thinking text.
        #[serde(default)]
        thinking: String,
        /// Provider signature over the thinking text.
        #[serde(default)]
        signature: String,
    },
}

/// Image source descriptor (Anthropic style).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageSource {
    /// Source type ("base64" or "url").
    pub r#type: String,
    /// MIME type of the image data.
    #[serde(rename = "media_type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Base64-encoded image data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Image URL with optional detail level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageUrl {
    /// Image URL (data URI or HTTP URL).
    pub url: String,
    /// Detail level ("low", "high", "auto").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Message in OpenAI conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role (system, user, assistant, tool).
    pub role: String,
    /// Message content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<OpenAIContent>,
    /// Reasoning content for thinking models.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    /// Tool calls made by assistant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Tool call ID for tool responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Function name for tool messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl OpenAIMessage {
    /// Create a plain text message with the given role.
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(OpenAIContent::Text(content.into())),
            reasoning_content: None,
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }
}

/// Tool call made by assistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCall {
    /// Unique tool call identifier.
    pub id: String,
    /// Tool type (always "function").
    pub r#type: String,
    /// Function call details.
    pub function: ToolFunction,
}

/// Function call details in tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolFunction {
    /// Function name.
    pub name: String,
    /// JSON-encoded function arguments.
    pub arguments: String,
}

/// OpenAI chat completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIResponse {
    /// Response identifier.
    pub id: String,
    /// Object type ("chat.completion").
    pub object: String,
    /// Unix timestamp of creation.
    pub created: u64,
    /// Model used for completion.
    pub model: String,
    /// Completion choices.
    pub choices: Vec<Choice>,
    /// Token usage statistics.
    pub usage: OpenAIUsage,
}

/// Single completion choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Choice index.
    pub index: u32,
    /// Generated message.
    pub message: OpenAIMessage,
    /// Reason for completion (stop, length, tool_calls).
    pub finish_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct OpenAIUsage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,
    /// Number of tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens used (prompt + completion).
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_deserializes_string_or_parts() {
        let text: OpenAIContent = serde_json::from_value(json!("hello")).expect("string form");
        assert_eq!(text, OpenAIContent::Text("hello".to_string()));

        let parts: OpenAIContent =
            serde_json::from_value(json!([{"type": "text", "text": "hi"}])).expect("array form");
        match parts {
            OpenAIContent::Parts(blocks) => assert_eq!(blocks.len(), 1),
            OpenAIContent::Text(_) => panic!("expected parts"),
        }
    }

    #[test]
    fn test_known_block_parses() {
        let block: ContentBlock = serde_json::from_value(json!({
            "type": "tool_use", "id": "call_1", "name": "get_weather", "input": {"city": "Oslo"}
        }))
        .expect("tool_use parses");

        match block {
            ContentBlock::ToolUse { name, .. } => assert_eq!(name, "get_weather"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_unknown_block_fails_per_block_not_per_request() {
        // Unknown block types stay as raw Values on the message; only the
        // per-block parse fails.
        let content: OpenAIContent = serde_json::from_value(json!([
            {"type": "text", "text": "ok"},
            {"type": "hologram", "payload": 42}
        ]))
        .expect("request-level parse succeeds");

        let OpenAIContent::Parts(blocks) = content else { panic!("expected parts") };
        assert!(serde_json::from_value::<ContentBlock>(blocks[0].clone()).is_ok());
        assert!(serde_json::from_value::<ContentBlock>(blocks[1].clone()).is_err());
    }
}
