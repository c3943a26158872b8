//! Generation config assembly, including per-family thinking configuration.

use antigravity_types::protocol::openai::OpenAIRequest;
use antigravity_types::ModelFamily;
use serde_json::{json, Value};

use crate::common::models::is_thinking_model;
use crate::config::{DEFAULT_THINKING_BUDGET, GEMINI_MAX_OUTPUT_TOKENS};

/// Tokens added on top of the thinking budget when it would swallow the
/// whole output allowance on Claude models.
const CLAUDE_THINKING_HEADROOM: u64 = 8_192;

/// Build the `generationConfig` object for a request against `model`.
pub fn build_generation_config(request: &OpenAIRequest, model: &str) -> Value {
    let family = ModelFamily::from_model_name(model);
    let mut config = json!({});

    if let Some(max_tokens) = request.max_tokens {
        config["maxOutputTokens"] = json!(max_tokens);
    }
    if let Some(temperature) = request.temperature {
        config["temperature"] = json!(temperature);
    }
    if let Some(top_p) = request.top_p {
        config["topP"] = json!(top_p);
    }
    if let Some(stop) = &request.stop {
        if stop.is_string() {
            config["stopSequences"] = json!([stop]);
        } else if stop.is_array() {
            config["stopSequences"] = stop.clone();
        }
    }

    if is_thinking_model(model) {
        let budget = request.thinking.as_ref().and_then(|t| t.budget_tokens);

        if family.is_claude() {
            // Claude expects the snake_case thinking keys
            let mut thinking_config = json!({"include_thoughts": true});
            if let Some(budget) = budget {
                thinking_config["thinking_budget"] = json!(budget);
                let max_tokens = config["maxOutputTokens"].as_u64().unwrap_or(0);
                if max_tokens != 0 && max_tokens <= budget {
                    config["maxOutputTokens"] = json!(budget + CLAUDE_THINKING_HEADROOM);
                }
            }
            config["thinkingConfig"] = thinking_config;
        } else {
            config["thinkingConfig"] = json!({
                "includeThoughts": true,
                "thinkingBudget": budget.unwrap_or(DEFAULT_THINKING_BUDGET),
            });
        }
    }

    if family.is_gemini() {
        let max_tokens = config["maxOutputTokens"].as_u64().unwrap_or(0);
        if max_tokens > GEMINI_MAX_OUTPUT_TOKENS {
            config["maxOutputTokens"] = json!(GEMINI_MAX_OUTPUT_TOKENS);
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use antigravity_types::protocol::openai::ThinkingParams;

    fn request(model: &str) -> OpenAIRequest {
        OpenAIRequest::new(model, vec![])
    }

    #[test]
    fn test_scalar_stop_wrapped_as_list() {
        let mut req = request("claude-sonnet-4.5");
        req.stop = Some(json!("END"));
        let config = build_generation_config(&req, "claude-sonnet-4.5");
        assert_eq!(config["stopSequences"], json!(["END"]));

        req.stop = Some(json!(["a", "b"]));
        let config = build_generation_config(&req, "claude-sonnet-4.5");
        assert_eq!(config["stopSequences"], json!(["a", "b"]));
    }

    #[test]
    fn test_gemini_max_tokens_clamped() {
        let mut req = request("gemini-2.5-pro");
        req.max_tokens = Some(32_000);
        let config = build_generation_config(&req, "gemini-2.5-pro");
        assert_eq!(config["maxOutputTokens"], json!(GEMINI_MAX_OUTPUT_TOKENS));
    }

    #[test]
    fn test_claude_max_tokens_not_clamped() {
        let mut req = request("claude-sonnet-4.5");
        req.max_tokens = Some(32_000);
        let config = build_generation_config(&req, "claude-sonnet-4.5");
        assert_eq!(config["maxOutputTokens"], json!(32_000));
    }

    #[test]
    fn test_claude_thinking_budget_raises_max_tokens() {
        let mut req = request("claude-opus-4.5-thinking");
        req.max_tokens = Some(4_096);
        req.thinking = Some(ThinkingParams { budget_tokens: Some(10_000) });

        let config = build_generation_config(&req, "claude-opus-4.5-thinking");
        assert_eq!(config["thinkingConfig"]["include_thoughts"], json!(true));
        assert_eq!(config["thinkingConfig"]["thinking_budget"], json!(10_000));
        assert_eq!(config["maxOutputTokens"], json!(10_000 + 8_192));
    }

    #[test]
    fn test_claude_thinking_keeps_sufficient_max_tokens() {
        let mut req = request("claude-opus-4.5-thinking");
        req.max_tokens = Some(30_000);
        req.thinking = Some(ThinkingParams { budget_tokens: Some(10_000) });

        let config = build_generation_config(&req, "claude-opus-4.5-thinking");
        assert_eq!(config["maxOutputTokens"], json!(30_000));
    }

    #[test]
    fn test_gemini_thinking_uses_camel_case_and_default_budget() {
        let req = request("gemini-3-flash");
        let config = build_generation_config(&req, "gemini-3-flash");

        assert_eq!(config["thinkingConfig"]["includeThoughts"], json!(true));
        assert_eq!(config["thinkingConfig"]["thinkingBudget"], json!(16_000));
        assert!(config["thinkingConfig"].get("include_thoughts").is_none());
    }

    #[test]
    fn test_non_thinking_model_has_no_thinking_config() {
        let req = request("gemini-2.5-pro");
        let config = build_generation_config(&req, "gemini-2.5-pro");
        assert!(config.get("thinkingConfig").is_none());
    }

    #[test]
    fn test_unset_params_omitted() {
        let req = request("gemini-2.5-pro");
        let config = build_generation_config(&req, "gemini-2.5-pro");
        assert!(config.get("maxOutputTokens").is_none());
        assert!(config.get("temperature").is_none());
        assert!(config.get("topP").is_none());
        assert!(config.get("stopSequences").is_none());
    }
}
