//! Google GenerateContent API types.
//!
//! The request side is assembled as raw JSON by the payload translator; only
//! the pieces the gateway reads back out of responses are typed here.

use serde::{Deserialize, Serialize};

/// Gemini usage metadata, as found under `usageMetadata` in a
/// generateContent response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeminiUsageMetadata {
    /// Number of tokens in the input prompt.
    #[serde(default)]
    pub prompt_token_count: u32,
    /// Number of tokens in the generated candidates.
    #[serde(default)]
    pub candidates_token_count: u32,
    /// Total token count (prompt + candidates).
    #[serde(default)]
    pub total_token_count: u32,
    /// Number of prompt tokens served from cache.
    #[serde(default)]
    pub cached_content_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_metadata_parses_partial_payload() {
        let meta: GeminiUsageMetadata = serde_json::from_str(
            r#"{"promptTokenCount": 120, "candidatesTokenCount": 40, "totalTokenCount": 160}"#,
        )
        .expect("parses");

        assert_eq!(meta.prompt_token_count, 120);
        assert_eq!(meta.cached_content_token_count, 0);
    }
}
