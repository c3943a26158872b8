//! Credential lifecycle orchestration.
//!
//! The authenticator owns the token and project caches and drives the OAuth
//! client against the account store: refreshing access tokens on demand,
//! resolving project ids, and onboarding new accounts through the browser
//! flow.

use std::sync::Arc;

use antigravity_types::{Account, GatewayError};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;

use super::callback;
use super::caches::{ProjectCache, TokenCache};
use super::oauth::OAuthClient;
use super::pkce;
use crate::account::AccountStore;
use crate::config::GatewayConfig;

/// Result of a completed add-account flow.
#[derive(Debug, Clone, Serialize)]
pub struct AddedAccount {
    pub email: String,
    pub project_id: String,
}

/// Shared credential manager for the whole pool.
pub struct Authenticator {
    store: Arc<AccountStore>,
    oauth: OAuthClient,
    token_cache: TokenCache,
    project_cache: ProjectCache,
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
    endpoints: Vec<String>,
}

impl Authenticator {
    pub fn new(store: Arc<AccountStore>, config: &GatewayConfig) -> Self {
        Self {
            store,
            oauth: OAuthClient::new(config.oauth.clone()),
            token_cache: TokenCache::new(),
            project_cache: ProjectCache::new(),
            refresh_locks: DashMap::new(),
            endpoints: config.endpoints.clone(),
        }
    }

    /// Resolve a bearer token for an account: cache hit, else refresh.
    ///
    /// Concurrent refreshes for the same email are collapsed behind a
    /// per-account lock; losers of the race pick up the winner's token from
    /// the cache.
    pub async fn get_token_for_account(&self, account: &Account) -> Result<String, GatewayError> {
        if let Some(token) = self.token_cache.get(&account.email) {
            return Ok(token);
        }

        if account.refresh_token.is_empty() {
            return Err(GatewayError::InvalidCredentials {
                status: 401,
                message: format!("No refresh token for account {}", account.email),
            });
        }

        let lock = self
            .refresh_locks
            .entry(account.email.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another dispatch may have refreshed while we waited for the lock
        if let Some(token) = self.token_cache.get(&account.email) {
            return Ok(token);
        }

        match self.oauth.refresh_access_token(&account.refresh_token).await {
            Ok(tokens) => {
                self.token_cache.set(&account.email, &tokens.access_token, tokens.expires_in_secs());
                tracing::debug!("Refreshed access token for {}", account.email);
                Ok(tokens.access_token)
            },
            Err(e @ GatewayError::InvalidCredentials { .. }) => Err(e),
            Err(e) => Err(GatewayError::Auth {
                status: 401,
                message: format!("Failed to refresh token for {}: {}", account.email, e),
            }),
        }
    }

    /// Resolve the project id for an account: cache, stored value, live
    /// discovery, fixed default — in that order. Discovered ids are written
    /// back to the store.
    pub async fn get_project_for_account(
        &self,
        account: &Account,
        token: &str,
    ) -> Result<String, GatewayError> {
        if let Some(project) = self.project_cache.get(&account.email) {
            return Ok(project);
        }

        if let Some(stored) = &account.project_id {
            self.project_cache.set(&account.email, stored);
            return Ok(stored.clone());
        }

        let discovered = self.oauth.discover_project_id(token, &self.endpoints).await;
        self.project_cache.set(&account.email, &discovered);
        self.store.set_project_id(&account.email, &discovered).await?;
        Ok(discovered)
    }

    /// Run the full interactive add-account flow.
    ///
    /// The authorization URL is handed to `present_url`; how it reaches the
    /// user's browser (terminal print, HTTP redirect) is the caller's
    /// business. The call then blocks on the loopback callback listener.
    pub async fn add_account<F>(&self, present_url: F) -> Result<AddedAccount, GatewayError>
    where
        F: FnOnce(&str),
    {
        let pkce_pair = pkce::generate_pkce();
        let state = pkce::generate_state_nonce();
        let auth_url = self.oauth.authorization_url(&pkce_pair.challenge, &state)?;

        present_url(&auth_url);

        let settings = self.oauth.settings();
        let code = callback::await_authorization_code(
            settings.callback_port,
            state,
            settings.callback_timeout,
        )
        .await?;

        let tokens = self.oauth.exchange_code(&code, &pkce_pair.verifier).await?;
        let refresh_token = tokens.refresh_token.clone().ok_or_else(|| GatewayError::Auth {
            status: 400,
            message: "No refresh token in response".to_string(),
        })?;

        let email = self.oauth.fetch_user_email(&tokens.access_token).await?;
        let project_id = self.oauth.discover_project_id(&tokens.access_token, &self.endpoints).await;

        let mut account = Account::new(email.clone(), refresh_token);
        account.project_id = Some(project_id.clone());
        self.store.upsert(account).await?;

        self.project_cache.set(&email, &project_id);
        self.prime_token(&email, &tokens.access_token, tokens.expires_in_secs());

        tracing::info!("Account added: {}", email);
        Ok(AddedAccount { email, project_id })
    }

    /// Seed the token cache with a known-fresh access token (used at the end
    /// of the add-account flow).
    pub fn prime_token(&self, email: &str, access_token: &str, expires_in_secs: u64) {
        self.token_cache.set(email, access_token, expires_in_secs);
    }

    /// Remove an account and its cached credentials.
    pub async fn remove_account(&self, email: &str) -> Result<bool, GatewayError> {
        let removed = self.store.remove(email).await?;
        if removed {
            self.token_cache.clear(Some(email));
            self.project_cache.clear(Some(email));
        }
        Ok(removed)
    }

    pub fn clear_token_cache(&self, email: Option<&str>) {
        self.token_cache.clear(email);
    }

    pub fn clear_project_cache(&self, email: Option<&str>) {
        self.project_cache.clear(email);
    }
}
