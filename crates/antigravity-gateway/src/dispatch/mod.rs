//! End-to-end dispatch orchestration.
//!
//! One dispatch walks: select account -> acquire token -> resolve project ->
//! build payload -> iterate endpoint fallbacks -> classify the response.
//! Rate limits and auth failures recover by rotating accounts; exhausted
//! quota walks the model-fallback map before giving up.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use antigravity_types::protocol::openai::{OpenAIRequest, OpenAIResponse};
use antigravity_types::{Account, GatewayError, ModelFamily};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde_json::Value;

use crate::account::AccountManager;
use crate::common::classify::{is_auth_error, is_rate_limit_error};
use crate::common::models::{fallback_model, is_thinking_model};
use crate::config::{antigravity_headers, GatewayConfig, MAX_RETRIES, MAX_WAIT_BEFORE_ERROR_MS};
use crate::mappers::openai::{build_request_payload, transform_google_response};
use crate::rate_limit::parser::parse_reset_time_ms;

/// Pause between endpoint attempts after an upstream 5xx.
const SERVER_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// What account selection decided for one attempt.
enum Selection {
    /// Use this account.
    Account(Account),
    /// Restart the dispatch under the fallback model.
    Fallback(String),
}

/// Outcome of one account's trip through the endpoint list.
enum AttemptOutcome {
    Success(Box<OpenAIResponse>),
    /// No classified error (e.g. all endpoints answered 401 and the caches
    /// were cleared); retry the loop so the next attempt re-authenticates.
    Retry,
}

/// Dispatches chat completions across the account pool.
pub struct Dispatcher {
    manager: Arc<AccountManager>,
    config: GatewayConfig,
    http: reqwest::Client,
}

impl Dispatcher {
    pub fn new(manager: Arc<AccountManager>, config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Upstream {
                status: 500,
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { manager, config, http })
    }

    pub fn manager(&self) -> &Arc<AccountManager> {
        &self.manager
    }

    /// Serve one chat completion.
    ///
    /// The model-fallback walk is a loop over the current model rather than
    /// recursion; each model is attempted at most once per dispatch because
    /// the fallback map is cyclic.
    pub async fn chat_completion(
        &self,
        request: &OpenAIRequest,
    ) -> Result<OpenAIResponse, GatewayError> {
        if self.manager.account_count().await == 0 {
            return Err(GatewayError::NoAccounts {
                message: "No Antigravity accounts configured. Add an account first.".to_string(),
            });
        }

        let mut model = request.model.clone();
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(model.clone());

        'model: loop {
            let max_attempts = MAX_RETRIES.max(self.manager.account_count().await + 1);

            for attempt in 0..max_attempts {
                let account = match self.select_account(&model, &mut visited).await? {
                    Selection::Account(account) => account,
                    Selection::Fallback(next_model) => {
                        model = next_model;
                        continue 'model;
                    },
                };

                tracing::debug!(
                    "Dispatch attempt {}/{} for {} via {}",
                    attempt + 1,
                    max_attempts,
                    model,
                    account.email
                );

                match self.dispatch_once(request, &model, &account).await {
                    Ok(AttemptOutcome::Success(response)) => return Ok(*response),
                    Ok(AttemptOutcome::Retry) => continue,
                    Err(error) => self.recover_or_surface(error, &model, &account).await?,
                }
            }

            return Err(GatewayError::Upstream {
                status: 500,
                message: "Max retries exceeded".to_string(),
            });
        }
    }

    /// Select an account for the current model, honoring sticky reuse,
    /// short-wait hints, pool-wide exhaustion, and model fallback.
    async fn select_account(
        &self,
        model: &str,
        visited: &mut HashSet<String>,
    ) -> Result<Selection, GatewayError> {
        let (mut account, wait_ms) = self.manager.pick_sticky(Some(model)).await;

        if account.is_none() && wait_ms > 0 && wait_ms <= MAX_WAIT_BEFORE_ERROR_MS {
            tracing::info!("Waiting {}ms for sticky account cooldown", wait_ms);
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
            self.manager.clear_expired_limits();
            account = self.manager.current_sticky(Some(model)).await;
        }

        if account.is_none() && self.manager.is_all_rate_limited(Some(model)).await {
            let pool_wait_ms = self.manager.get_min_wait_time_ms(Some(model));
            if pool_wait_ms > MAX_WAIT_BEFORE_ERROR_MS {
                if let Some(next_model) = unvisited_fallback(model, visited) {
                    tracing::warn!(
                        "All accounts rate-limited for {} ({}ms), falling back to {}",
                        model,
                        pool_wait_ms,
                        next_model
                    );
                    return Ok(Selection::Fallback(next_model));
                }
                return Err(GatewayError::QuotaExhausted {
                    model: model.to_string(),
                    wait_ms: pool_wait_ms,
                });
            }

            tracing::warn!("All accounts rate-limited, waiting {}ms", pool_wait_ms);
            tokio::time::sleep(Duration::from_millis(pool_wait_ms)).await;
            self.manager.clear_expired_limits();
            account = self.manager.pick_next(Some(model)).await;
        }

        match account {
            Some(account) => Ok(Selection::Account(account)),
            None => {
                if let Some(next_model) = unvisited_fallback(model, visited) {
                    tracing::warn!("No account usable for {}, falling back to {}", model, next_model);
                    Ok(Selection::Fallback(next_model))
                } else {
                    Err(GatewayError::NoAccounts {
                        message: format!("No accounts available for {}", model),
                    })
                }
            },
        }
    }

    /// Run one account against the endpoint fallback list.
    async fn dispatch_once(
        &self,
        request: &OpenAIRequest,
        model: &str,
        account: &Account,
    ) -> Result<AttemptOutcome, GatewayError> {
        let token = self.manager.get_token_for_account(account).await?;
        let project = self.manager.get_project_for_account(account, &token).await?;

        let payload = build_request_payload(request, model, &project);
        let headers = build_upstream_headers(&token, model)?;

        let mut last_error: Option<GatewayError> = None;

        for endpoint in &self.config.endpoints {
            let url = format!("{}/v1internal:generateContent", endpoint);

            let response =
                match self.http.post(&url).headers(headers.clone()).json(&payload).send().await {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::warn!("Request failed at {}: {}", endpoint, e);
                        last_error = Some(GatewayError::Upstream {
                            status: 502,
                            message: format!("Request failed at {}: {}", endpoint, e),
                        });
                        continue;
                    },
                };

            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                tracing::warn!("Auth error at {}, clearing cached credentials", endpoint);
                self.manager.clear_token_cache(Some(&account.email));
                self.manager.clear_project_cache(Some(&account.email));
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let body = response.text().await.unwrap_or_default();
                let reset_ms = parse_reset_time_ms(&body);
                tracing::info!("Rate limited at {} (reset: {:?}ms)", endpoint, reset_ms);
                last_error =
                    Some(GatewayError::RateLimited { message: format!("Rate limited: {}", body), reset_ms });
                continue;
            }

            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!("Server error {} at {}", status, endpoint);
                last_error = Some(GatewayError::Upstream {
                    status: status.as_u16(),
                    message: format!("Server error {}: {}", status, body),
                });
                tokio::time::sleep(SERVER_ERROR_BACKOFF).await;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                last_error = Some(GatewayError::Upstream {
                    status: status.as_u16(),
                    message: format!("Upstream returned {}: {}", status, body),
                });
                continue;
            }

            let google_response: Value = match response.json().await {
                Ok(value) => value,
                Err(e) => {
                    last_error = Some(GatewayError::Upstream {
                        status: 502,
                        message: format!("Response parse failed at {}: {}", endpoint, e),
                    });
                    continue;
                },
            };

            return Ok(AttemptOutcome::Success(Box::new(transform_google_response(
                &google_response,
                model,
            ))));
        }

        match last_error {
            Some(GatewayError::RateLimited { message, reset_ms }) => {
                self.manager.mark_rate_limited(&account.email, reset_ms, Some(model));
                Err(GatewayError::RateLimited { message, reset_ms })
            },
            Some(error) => Err(error),
            None => Ok(AttemptOutcome::Retry),
        }
    }

    /// Decide whether a failed attempt rotates to another account or
    /// surfaces to the caller.
    async fn recover_or_surface(
        &self,
        error: GatewayError,
        model: &str,
        account: &Account,
    ) -> Result<(), GatewayError> {
        match &error {
            GatewayError::RateLimited { .. } => {
                tracing::info!("Account {} rate-limited, trying next", account.email);
                Ok(())
            },
            GatewayError::Auth { .. } | GatewayError::InvalidCredentials { .. } => {
                self.manager.mark_invalid(&account.email, &error.to_string()).await;
                tracing::warn!("Account {} invalid, trying next", account.email);
                Ok(())
            },
            GatewayError::Upstream { status, .. } if *status >= 500 => {
                tracing::warn!("Server error through {}, rotating account", account.email);
                let _ = self.manager.pick_next(Some(model)).await;
                Ok(())
            },
            _ => {
                // Status already lost somewhere; fall back to text matching
                let message = error.to_string();
                if is_rate_limit_error(&message) {
                    self.manager.mark_rate_limited(&account.email, None, Some(model));
                    Ok(())
                } else if is_auth_error(&message) {
                    self.manager.mark_invalid(&account.email, &message).await;
                    Ok(())
                } else {
                    Err(error)
                }
            },
        }
    }
}

fn unvisited_fallback(model: &str, visited: &mut HashSet<String>) -> Option<String> {
    let next_model = fallback_model(model)?;
    if visited.contains(next_model) {
        return None;
    }
    visited.insert(next_model.to_string());
    Some(next_model.to_string())
}

/// Headers for a generateContent call.
fn build_upstream_headers(token: &str, model: &str) -> Result<HeaderMap, GatewayError> {
    let mut headers = HeaderMap::new();

    let mut insert = |name: &str, value: &str| -> Result<(), GatewayError> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| GatewayError::Upstream {
            status: 500,
            message: format!("Invalid header name: {}", e),
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| GatewayError::Upstream {
            status: 500,
            message: format!("Invalid header value: {}", e),
        })?;
        headers.insert(name, value);
        Ok(())
    };

    insert("Authorization", &format!("Bearer {}", token))?;
    insert("Content-Type", "application/json")?;
    for (name, value) in antigravity_headers() {
        insert(name, &value)?;
    }

    if ModelFamily::from_model_name(model).is_claude() && is_thinking_model(model) {
        insert("anthropic-beta", "interleaved-thinking-2025-05-14")?;
    }

    Ok(headers)
}
