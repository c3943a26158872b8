//! Random ID helpers and session-ID derivation.

use antigravity_types::protocol::openai::{OpenAIContent, OpenAIMessage};
use sha2::{Digest, Sha256};

/// How much of the first user message feeds the session hash.
const SESSION_SEED_CHARS: usize = 500;

/// Hex-encode `count` random bytes.
pub fn random_hex(count: usize) -> String {
    use rand::RngCore;
    let mut bytes = vec![0u8; count];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

/// Upstream request identifier (`agent-` + 16 random bytes).
pub fn generate_request_id() -> String {
    format!("agent-{}", random_hex(16))
}

/// OpenAI completion identifier (`chatcmpl-` + 16 random bytes).
pub fn generate_completion_id() -> String {
    format!("chatcmpl-{}", random_hex(16))
}

/// Tool-call identifier used when the upstream omits one.
pub fn generate_tool_call_id() -> String {
    format!("call_{}", random_hex(12))
}

/// Derive a stable session ID from the first user message, so retries and
/// follow-ups of the same conversation land on the same upstream session.
///
/// Falls back to a random ID when the conversation has no user message.
pub fn derive_session_id(messages: &[OpenAIMessage]) -> String {
    let first_user = messages.iter().find(|m| m.role == "user");

    let Some(message) = first_user else {
        return random_hex(8);
    };

    let text = match &message.content {
        Some(OpenAIContent::Text(s)) => s.clone(),
        Some(OpenAIContent::Parts(parts)) => {
            serde_json::to_string(parts).unwrap_or_default()
        },
        None => String::new(),
    };

    let seed: String = text.chars().take(SESSION_SEED_CHARS).collect();
    let digest = Sha256::digest(seed.as_bytes());
    let mut hex = hex_encode(&digest);
    hex.truncate(16);
    hex
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_hex_length() {
        assert_eq!(random_hex(16).len(), 32);
        assert!(random_hex(8).chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_id_prefixes() {
        assert!(generate_request_id().starts_with("agent-"));
        assert_eq!(generate_request_id().len(), "agent-".len() + 32);
        assert!(generate_completion_id().starts_with("chatcmpl-"));
        assert!(generate_tool_call_id().starts_with("call_"));
        assert_eq!(generate_tool_call_id().len(), "call_".len() + 24);
    }

    #[test]
    fn test_session_id_is_deterministic_for_same_first_user_message() {
        let messages =
            vec![OpenAIMessage::text("system", "be brief"), OpenAIMessage::text("user", "hello")];
        let a = derive_session_id(&messages);
        let b = derive_session_id(&messages);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_session_id_random_without_user_message() {
        let messages = vec![OpenAIMessage::text("system", "be brief")];
        let a = derive_session_id(&messages);
        let b = derive_session_id(&messages);
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }
}
