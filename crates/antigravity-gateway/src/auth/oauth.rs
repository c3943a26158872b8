//! Google OAuth client: authorization URL, code exchange, refresh, userinfo
//! lookup, and project discovery.

use antigravity_types::GatewayError;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::{antigravity_headers, OAuthSettings, DEFAULT_PROJECT_ID};

/// Timeout for the short OAuth/control-plane HTTP calls (the long
/// generateContent timeout does not apply here).
const OAUTH_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl TokenResponse {
    /// Token lifetime in seconds, defaulting to one hour when the endpoint
    /// omits it.
    pub fn expires_in_secs(&self) -> u64 {
        self.expires_in.unwrap_or(3600)
    }
}

/// Stateless OAuth HTTP client.
pub struct OAuthClient {
    http: reqwest::Client,
    settings: OAuthSettings,
}

impl OAuthClient {
    pub fn new(settings: OAuthSettings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(OAUTH_HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http, settings }
    }

    pub fn settings(&self) -> &OAuthSettings {
        &self.settings
    }

    /// Build the browser authorization URL for a PKCE challenge and CSRF
    /// state nonce.
    pub fn authorization_url(&self, code_challenge: &str, state: &str) -> Result<String, GatewayError> {
        let mut url = url::Url::parse(&self.settings.auth_url).map_err(|e| GatewayError::Auth {
            status: 500,
            message: format!("Invalid authorization URL: {}", e),
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("redirect_uri", &self.settings.redirect_uri())
            .append_pair("response_type", "code")
            .append_pair("scope", &self.settings.scopes.join(" "))
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("state", state);

        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
    ) -> Result<TokenResponse, GatewayError> {
        let params = [
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", &self.settings.redirect_uri()),
        ];

        let response = self
            .http
            .post(&self.settings.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::Auth {
                status: 502,
                message: format!("Token exchange request failed: {}", e),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(GatewayError::Auth {
                status: status.as_u16(),
                message: format!("Token exchange failed: {}", body),
            });
        }

        let tokens: TokenResponse = serde_json::from_str(&body).map_err(|_| GatewayError::Auth {
            status: 400,
            message: "No access token in response".to_string(),
        })?;

        Ok(tokens)
    }

    /// Redeem a refresh token for a fresh access token.
    ///
    /// A rejection here means the stored credentials are dead, not merely
    /// cooled down, hence `InvalidCredentials`.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, GatewayError> {
        let params = [
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&self.settings.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::Upstream {
                status: 502,
                message: format!("Token refresh request failed: {}", e),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(GatewayError::InvalidCredentials {
                status: status.as_u16(),
                message: format!("Token refresh failed: {}", body),
            });
        }

        serde_json::from_str(&body).map_err(|_| GatewayError::InvalidCredentials {
            status: 400,
            message: "No access token in refresh response".to_string(),
        })
    }

    /// Look up the email claim for an access token.
    pub async fn fetch_user_email(&self, access_token: &str) -> Result<String, GatewayError> {
        let response = self
            .http
            .get(&self.settings.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| GatewayError::Auth {
                status: 502,
                message: format!("Userinfo request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Auth {
                status: status.as_u16(),
                message: format!("Failed to get user info: {}", body),
            });
        }

        let claims: Value = response.json().await.map_err(|e| GatewayError::Auth {
            status: 502,
            message: format!("Userinfo parse failed: {}", e),
        })?;

        Ok(claims
            .get("email")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string())
    }

    /// Discover the Cloud Code companion project for an access token.
    ///
    /// Tries every endpoint in fallback order and settles for the fixed
    /// default project when none answers.
    pub async fn discover_project_id(&self, access_token: &str, endpoints: &[String]) -> String {
        let body = json!({
            "metadata": {
                "ideType": "IDE_UNSPECIFIED",
                "platform": "PLATFORM_UNSPECIFIED",
                "pluginType": "GEMINI",
            }
        });

        for endpoint in endpoints {
            let url = format!("{}/v1internal:loadCodeAssist", endpoint);
            let mut request = self.http.post(&url).bearer_auth(access_token).json(&body);
            for (name, value) in antigravity_headers() {
                request = request.header(name, value);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Project discovery failed at {}: {}", endpoint, e);
                    continue;
                },
            };

            if !response.status().is_success() {
                tracing::debug!(
                    "Project discovery returned {} at {}",
                    response.status(),
                    endpoint
                );
                continue;
            }

            let data: Value = match response.json().await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!("Project discovery parse failed at {}: {}", endpoint, e);
                    continue;
                },
            };

            if let Some(project) = data.get("cloudaicompanionProject").and_then(Value::as_str) {
                return project.to_string();
            }
            if let Some(project) = data
                .get("cloudaicompanionProject")
                .and_then(|p| p.get("id"))
                .and_then(Value::as_str)
            {
                return project.to_string();
            }
        }

        tracing::info!("No companion project discovered, using default {}", DEFAULT_PROJECT_ID);
        DEFAULT_PROJECT_ID.to_string()
    }
}
