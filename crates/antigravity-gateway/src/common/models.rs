//! Supported model table, fallback mapping, and thinking-model detection.

use antigravity_types::ModelFamily;
use regex::Regex;
use std::sync::OnceLock;

/// Supported models (all functional via Antigravity).
pub const SUPPORTED_MODELS: [&str; 8] = [
    // Claude models
    "claude-sonnet-4.5-thinking",
    "claude-opus-4.5-thinking",
    "claude-sonnet-4.5",
    // Gemini 3 models
    "gemini-3-flash",
    "gemini-3-pro-high",
    "gemini-3-pro-low",
    // Gemini 2.5 models
    "gemini-2.5-flash",
    "gemini-2.5-pro",
];

/// Check whether a model id is in the supported table.
pub fn is_supported_model(model: &str) -> bool {
    SUPPORTED_MODELS.contains(&model)
}

/// Fallback model used when a primary model's quota is exhausted across the
/// whole pool.
pub fn fallback_model(model: &str) -> Option<&'static str> {
    match model {
        "gemini-3-pro-high" => Some("claude-opus-4.5-thinking"),
        "gemini-3-pro-low" => Some("claude-sonnet-4.5"),
        "gemini-3-flash" => Some("claude-sonnet-4.5-thinking"),
        "gemini-2.5-flash" => Some("claude-sonnet-4.5"),
        "gemini-2.5-pro" => Some("claude-opus-4.5-thinking"),
        "claude-opus-4.5-thinking" => Some("gemini-3-pro-high"),
        "claude-sonnet-4.5-thinking" => Some("gemini-3-flash"),
        "claude-sonnet-4.5" => Some("gemini-2.5-flash"),
        _ => None,
    }
}

fn gemini_version_regex() -> &'static Regex {
    static GEMINI_VERSION: OnceLock<Regex> = OnceLock::new();
    GEMINI_VERSION.get_or_init(|| Regex::new(r"gemini[.-]?(\d+)").expect("Gemini version regex is valid"))
}

/// Check if a model supports thinking/reasoning output.
///
/// Claude thinking models carry "thinking" in the name. Gemini models are
/// thinking-capable when named so explicitly, or from major version 3 on.
pub fn is_thinking_model(model: &str) -> bool {
    let lower = model.to_lowercase();
    match ModelFamily::from_model_name(&lower) {
        ModelFamily::Claude => lower.contains("thinking"),
        ModelFamily::Gemini => {
            if lower.contains("thinking") {
                return true;
            }
            gemini_version_regex()
                .captures(&lower)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .is_some_and(|version| version >= 3)
        },
        ModelFamily::Unknown => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thinking_detection() {
        assert!(is_thinking_model("claude-sonnet-4.5-thinking"));
        assert!(!is_thinking_model("claude-sonnet-4.5"));
        assert!(is_thinking_model("gemini-3-flash"));
        assert!(is_thinking_model("gemini-3-pro-high"));
        assert!(!is_thinking_model("gemini-2.5-pro"));
        assert!(is_thinking_model("gemini-2.5-flash-thinking"));
        assert!(!is_thinking_model("gpt-4o"));
    }

    #[test]
    fn test_fallback_map_round_trips_families() {
        for model in SUPPORTED_MODELS {
            let fallback = fallback_model(model).expect("every supported model has a fallback");
            assert!(is_supported_model(fallback), "fallback {fallback} must be supported");
            // The fallback always crosses the family boundary
            assert_ne!(
                ModelFamily::from_model_name(model),
                ModelFamily::from_model_name(fallback)
            );
        }
    }

    #[test]
    fn test_unknown_model_has_no_fallback() {
        assert_eq!(fallback_model("gpt-4o"), None);
    }
}
