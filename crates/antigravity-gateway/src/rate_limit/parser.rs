//! Reset-time parsing from upstream 429 bodies.
//!
//! Quota errors carry a human-readable hint like `"reset after 5h30m"`. The
//! patterns are tried longest-first so `"1h0m0s"` is not half-matched by the
//! single-unit forms.

use regex::Regex;
use std::sync::OnceLock;

fn reset_h_m_s_regex() -> &'static Regex {
    static RESET_H_M_S: OnceLock<Regex> = OnceLock::new();
    RESET_H_M_S.get_or_init(|| {
        Regex::new(r"(?i)reset after (\d+)h(\d+)m(\d+)s").expect("Reset h m s regex is valid")
    })
}

fn reset_h_m_regex() -> &'static Regex {
    static RESET_H_M: OnceLock<Regex> = OnceLock::new();
    RESET_H_M
        .get_or_init(|| Regex::new(r"(?i)reset after (\d+)h(\d+)m").expect("Reset h m regex is valid"))
}

fn reset_h_regex() -> &'static Regex {
    static RESET_H: OnceLock<Regex> = OnceLock::new();
    RESET_H.get_or_init(|| Regex::new(r"(?i)reset after (\d+)h").expect("Reset h regex is valid"))
}

fn reset_m_s_regex() -> &'static Regex {
    static RESET_M_S: OnceLock<Regex> = OnceLock::new();
    RESET_M_S
        .get_or_init(|| Regex::new(r"(?i)reset after (\d+)m(\d+)s").expect("Reset m s regex is valid"))
}

fn reset_m_regex() -> &'static Regex {
    static RESET_M: OnceLock<Regex> = OnceLock::new();
    RESET_M.get_or_init(|| Regex::new(r"(?i)reset after (\d+)m").expect("Reset m regex is valid"))
}

fn reset_s_regex() -> &'static Regex {
    static RESET_S: OnceLock<Regex> = OnceLock::new();
    RESET_S.get_or_init(|| Regex::new(r"(?i)reset after (\d+)s").expect("Reset s regex is valid"))
}

const HOUR_MS: u64 = 3_600_000;
const MINUTE_MS: u64 = 60_000;
const SECOND_MS: u64 = 1_000;

fn capture_u64(caps: &regex::Captures<'_>, index: usize) -> u64 {
    caps.get(index).and_then(|m| m.as_str().parse::<u64>().ok()).unwrap_or(0)
}

/// Parse a quota reset hint from an error body.
///
/// Returns the total wait in milliseconds, or `None` when the body carries
/// no recognizable pattern (callers then apply the default cooldown).
pub fn parse_reset_time_ms(error_text: &str) -> Option<u64> {
    if let Some(caps) = reset_h_m_s_regex().captures(error_text) {
        return Some(
            capture_u64(&caps, 1) * HOUR_MS
                + capture_u64(&caps, 2) * MINUTE_MS
                + capture_u64(&caps, 3) * SECOND_MS,
        );
    }

    if let Some(caps) = reset_h_m_regex().captures(error_text) {
        return Some(capture_u64(&caps, 1) * HOUR_MS + capture_u64(&caps, 2) * MINUTE_MS);
    }

    if let Some(caps) = reset_h_regex().captures(error_text) {
        return Some(capture_u64(&caps, 1) * HOUR_MS);
    }

    if let Some(caps) = reset_m_s_regex().captures(error_text) {
        return Some(capture_u64(&caps, 1) * MINUTE_MS + capture_u64(&caps, 2) * SECOND_MS);
    }

    if let Some(caps) = reset_m_regex().captures(error_text) {
        return Some(capture_u64(&caps, 1) * MINUTE_MS);
    }

    if let Some(caps) = reset_s_regex().captures(error_text) {
        return Some(capture_u64(&caps, 1) * SECOND_MS);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_duration() {
        assert_eq!(parse_reset_time_ms("quota will reset after 1h0m0s"), Some(3_600_000));
        assert_eq!(parse_reset_time_ms("reset after 2h30m15s"), Some(9_015_000));
    }

    #[test]
    fn test_partial_durations() {
        assert_eq!(parse_reset_time_ms("reset after 5h30m"), Some(19_800_000));
        assert_eq!(parse_reset_time_ms("reset after 2h"), Some(7_200_000));
        assert_eq!(parse_reset_time_ms("reset after 5m30s"), Some(330_000));
        assert_eq!(parse_reset_time_ms("reset after 5m"), Some(300_000));
        assert_eq!(parse_reset_time_ms("reset after 45s"), Some(45_000));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(parse_reset_time_ms("RESOURCE_EXHAUSTED: Reset After 30S"), Some(30_000));
    }

    #[test]
    fn test_embedded_in_json_body() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded, reset after 1h15m"}}"#;
        assert_eq!(parse_reset_time_ms(body), Some(4_500_000));
    }

    #[test]
    fn test_unparseable_returns_none() {
        assert_eq!(parse_reset_time_ms("too many requests"), None);
        assert_eq!(parse_reset_time_ms(""), None);
        assert_eq!(parse_reset_time_ms("reset after tomorrow"), None);
    }
}
