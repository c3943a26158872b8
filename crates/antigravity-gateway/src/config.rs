//! Gateway constants and runtime configuration.
//!
//! The constants mirror what the Antigravity desktop client ships with: the
//! Cloud Code endpoints in fallback order, the installed-app OAuth client,
//! and the cooldown/retry thresholds used by the dispatcher.

use std::path::PathBuf;
use std::time::Duration;

/// Client version reported in the upstream User-Agent.
pub const ANTIGRAVITY_VERSION: &str = "1.11.5";

/// Cloud Code API endpoints (in fallback order: daily -> prod).
pub const ENDPOINT_DAILY: &str = "https://daily-cloudcode-pa.sandbox.googleapis.com";
/// Production Cloud Code endpoint, tried after the daily sandbox.
pub const ENDPOINT_PROD: &str = "https://cloudcode-pa.googleapis.com";

/// Default project ID if none can be discovered.
pub const DEFAULT_PROJECT_ID: &str = "rising-fact-p41fc";

/// Cooldown applied when a 429 body carries no parsable reset time.
pub const DEFAULT_COOLDOWN_MS: u64 = 60_000;
/// Max retry attempts across accounts (floor; the pool size can raise it).
pub const MAX_RETRIES: usize = 5;
/// Waits longer than this surface an error instead of sleeping.
pub const MAX_WAIT_BEFORE_ERROR_MS: u64 = 120_000;
/// Minimum valid thinking signature length.
pub const MIN_SIGNATURE_LENGTH: usize = 50;
/// Hard cap the Gemini family enforces on maxOutputTokens.
pub const GEMINI_MAX_OUTPUT_TOKENS: u64 = 16_384;
/// Default thinking budget when the caller does not set one.
pub const DEFAULT_THINKING_BUDGET: u64 = 16_000;

/// Per-endpoint upstream request timeout.
pub const UPSTREAM_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);
/// How long the loopback listener waits for the OAuth callback.
pub const OAUTH_CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

// Google OAuth configuration (same credentials as the Antigravity app).
// This is an installed-app client: the "secret" ships inside every client
// binary and is not confidential for this grant type.
pub const OAUTH_CLIENT_ID: &str =
    "1071006060591-tmhssin2h21lcre235vtolojh4g403ep.apps.googleusercontent.com";
pub const OAUTH_CLIENT_SECRET: &str = "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";
pub const OAUTH_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const OAUTH_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v1/userinfo";
pub const OAUTH_CALLBACK_PORT: u16 = 51121;
pub const OAUTH_SCOPES: [&str; 5] = [
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/cclog",
    "https://www.googleapis.com/auth/experimentsandconfigs",
];

/// Generate the platform-specific User-Agent string.
pub fn platform_user_agent() -> String {
    format!("antigravity/{} {}/{}", ANTIGRAVITY_VERSION, std::env::consts::OS, std::env::consts::ARCH)
}

/// Headers required on every Cloud Code API request (besides Authorization).
pub fn antigravity_headers() -> [(&'static str, String); 3] {
    [
        ("User-Agent", platform_user_agent()),
        ("X-Goog-Api-Client", "google-cloud-sdk vscode_cloudshelleditor/0.1".to_string()),
        (
            "Client-Metadata",
            r#"{"ideType":"IDE_UNSPECIFIED","platform":"PLATFORM_UNSPECIFIED","pluginType":"GEMINI"}"#
                .to_string(),
        ),
    ]
}

/// OAuth client settings.
///
/// Kept separate from [`GatewayConfig`] so tests can point the token and
/// userinfo URLs at a mock server.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub callback_port: u16,
    pub callback_timeout: Duration,
    pub scopes: Vec<String>,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            client_id: OAUTH_CLIENT_ID.to_string(),
            client_secret: OAUTH_CLIENT_SECRET.to_string(),
            auth_url: OAUTH_AUTH_URL.to_string(),
            token_url: OAUTH_TOKEN_URL.to_string(),
            userinfo_url: OAUTH_USERINFO_URL.to_string(),
            callback_port: OAUTH_CALLBACK_PORT,
            callback_timeout: OAUTH_CALLBACK_TIMEOUT,
            scopes: OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl OAuthSettings {
    /// The loopback redirect URI registered for the installed-app client.
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/oauth-callback", self.callback_port)
    }
}

/// Runtime configuration for the gateway core.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Upstream endpoints in fallback order.
    pub endpoints: Vec<String>,
    /// Path of the persisted account document.
    pub accounts_path: PathBuf,
    /// Per-endpoint upstream request timeout.
    pub request_timeout: Duration,
    /// OAuth client settings.
    pub oauth: OAuthSettings,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![ENDPOINT_DAILY.to_string(), ENDPOINT_PROD.to_string()],
            accounts_path: default_config_dir().join("accounts.json"),
            request_timeout: UPSTREAM_REQUEST_TIMEOUT,
            oauth: OAuthSettings::default(),
        }
    }
}

impl GatewayConfig {
    /// Build a configuration honoring the `ANTIGRAVITY_*` environment
    /// variables (`ANTIGRAVITY_CONFIG_DIR`, `ANTIGRAVITY_ACCOUNTS_FILE`,
    /// `ANTIGRAVITY_API_BASE`).
    pub fn from_env() -> Self {
        let config_dir = std::env::var("ANTIGRAVITY_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_dir());
        let accounts_file = std::env::var("ANTIGRAVITY_ACCOUNTS_FILE")
            .unwrap_or_else(|_| "accounts.json".to_string());

        let mut endpoints = vec![ENDPOINT_DAILY.to_string(), ENDPOINT_PROD.to_string()];
        if let Ok(base) = std::env::var("ANTIGRAVITY_API_BASE") {
            let base = base.trim_end_matches('/').to_string();
            if !base.is_empty() {
                endpoints.retain(|e| *e != base);
                endpoints.insert(0, base);
            }
        }

        Self {
            endpoints,
            accounts_path: config_dir.join(accounts_file),
            request_timeout: UPSTREAM_REQUEST_TIMEOUT,
            oauth: OAuthSettings::default(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config/litellm/antigravity")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_shape() {
        let ua = platform_user_agent();
        assert!(ua.starts_with("antigravity/"));
        assert!(ua.contains('/'));
    }

    #[test]
    fn test_default_endpoints_order() {
        let config = GatewayConfig::default();
        assert_eq!(config.endpoints[0], ENDPOINT_DAILY);
        assert_eq!(config.endpoints[1], ENDPOINT_PROD);
    }

    #[test]
    fn test_redirect_uri_uses_callback_port() {
        let oauth = OAuthSettings::default();
        assert_eq!(oauth.redirect_uri(), "http://localhost:51121/oauth-callback");
    }
}
