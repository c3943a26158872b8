//! Error-text classification.
//!
//! Last-resort fallback for errors whose HTTP status has already been lost;
//! the dispatcher prefers matching on typed [`GatewayError`] variants.
//!
//! [`GatewayError`]: antigravity_types::GatewayError

/// Check if an error message describes a rate limit.
pub fn is_rate_limit_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("429")
        || lower.contains("resource_exhausted")
        || lower.contains("quota_exhausted")
        || lower.contains("rate limit")
}

/// Check if an error message describes an authentication failure.
pub fn is_auth_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("401")
        || lower.contains("unauthenticated")
        || lower.contains("authentication")
        || lower.contains("invalid_grant")
}
