//! Account selection and cooldown bookkeeping.
//!
//! The manager fronts the store, the credential lifecycle, and the
//! rate-limit ledger with the selection policy the dispatcher consumes:
//! sticky reuse of the current account, round-robin rotation past limited
//! or invalid entries, and short-wait hints when the sticky account's
//! cooldown is about to lapse.

use std::sync::{Arc, Mutex};

use antigravity_types::{Account, AccountStatus, GatewayError, PoolStatus};

use super::store::AccountStore;
use crate::auth::{AddedAccount, Authenticator};
use crate::config::{GatewayConfig, MAX_WAIT_BEFORE_ERROR_MS};
use crate::rate_limit::RateLimitLedger;

/// Shared account pool with round-robin selection state.
pub struct AccountManager {
    store: Arc<AccountStore>,
    authenticator: Authenticator,
    ledger: RateLimitLedger,
    current_index: Mutex<usize>,
}

impl AccountManager {
    /// Load the pool from the configured accounts file.
    pub async fn new(config: &GatewayConfig) -> Self {
        let store = Arc::new(AccountStore::load(config.accounts_path.clone()).await);
        Self {
            authenticator: Authenticator::new(Arc::clone(&store), config),
            store,
            ledger: RateLimitLedger::new(),
            current_index: Mutex::new(0),
        }
    }

    pub fn ledger(&self) -> &RateLimitLedger {
        &self.ledger
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub async fn accounts(&self) -> Vec<Account> {
        self.store.list().await
    }

    pub async fn account_count(&self) -> usize {
        self.store.count().await
    }

    fn is_selectable(&self, account: &Account, model: Option<&str>) -> bool {
        !account.is_invalid && !self.ledger.is_limited(&account.email, model)
    }

    /// Accounts neither invalid nor limited for the given model.
    pub async fn available_accounts(&self, model: Option<&str>) -> Vec<Account> {
        self.store
            .list()
            .await
            .into_iter()
            .filter(|a| self.is_selectable(a, model))
            .collect()
    }

    /// True when the pool is non-empty but nothing is selectable.
    pub async fn is_all_rate_limited(&self, model: Option<&str>) -> bool {
        self.available_accounts(model).await.is_empty() && self.account_count().await > 0
    }

    /// Advance the round-robin pointer to the next selectable account.
    ///
    /// Visits at most one full cycle; if every account is invalid or
    /// limited, the pointer is restored and `None` is returned.
    pub async fn pick_next(&self, model: Option<&str>) -> Option<Account> {
        let accounts = self.store.list().await;
        if accounts.is_empty() {
            return None;
        }

        let mut index = self.current_index.lock().unwrap_or_else(|e| e.into_inner());
        let start = *index;

        for _ in 0..accounts.len() {
            *index = (*index + 1) % accounts.len();
            let account = &accounts[*index];
            if self.is_selectable(account, model) {
                return Some(account.clone());
            }
        }

        *index = start;
        None
    }

    /// Return the account under the pointer if it is usable right now.
    pub async fn current_sticky(&self, model: Option<&str>) -> Option<Account> {
        let accounts = self.store.list().await;
        if accounts.is_empty() {
            return None;
        }

        let mut index = self.current_index.lock().unwrap_or_else(|e| e.into_inner());
        if *index >= accounts.len() {
            *index = 0;
        }

        let account = &accounts[*index];
        self.is_selectable(account, model).then(|| account.clone())
    }

    /// Whether it is worth sleeping for the sticky account's cooldown:
    /// reports `(true, wait_ms, account)` when the current account is valid
    /// and its residual wait is positive but within the error threshold.
    pub async fn should_wait_for_current(
        &self,
        model: Option<&str>,
    ) -> (bool, u64, Option<Account>) {
        let accounts = self.store.list().await;
        let index = *self.current_index.lock().unwrap_or_else(|e| e.into_inner());
        if accounts.is_empty() || index >= accounts.len() {
            return (false, 0, None);
        }

        let account = &accounts[index];
        if account.is_invalid {
            return (false, 0, None);
        }

        let wait_ms = self.ledger.remaining_wait_ms(&account.email, model);
        if wait_ms > 0 && wait_ms <= MAX_WAIT_BEFORE_ERROR_MS {
            return (true, wait_ms, Some(account.clone()));
        }

        (false, 0, None)
    }

    /// Sticky-first selection.
    ///
    /// Prefers the current account; for a briefly limited current account
    /// (wait within half the error threshold) returns `(None, wait_ms)` as a
    /// hint that the caller should sleep instead of rotating; otherwise
    /// falls through to [`pick_next`](Self::pick_next).
    pub async fn pick_sticky(&self, model: Option<&str>) -> (Option<Account>, u64) {
        if let Some(account) = self.current_sticky(model).await {
            return (Some(account), 0);
        }

        let (should_wait, wait_ms, _) = self.should_wait_for_current(model).await;
        if should_wait && wait_ms <= MAX_WAIT_BEFORE_ERROR_MS / 2 {
            return (None, wait_ms);
        }

        (self.pick_next(model).await, 0)
    }

    /// Record an upstream cooldown for an account.
    pub fn mark_rate_limited(&self, email: &str, reset_ms: Option<u64>, model: Option<&str>) {
        self.ledger.mark(email, reset_ms, model);
    }

    /// Invalidate an account for the rest of this process lifetime.
    pub async fn mark_invalid(&self, email: &str, reason: &str) {
        tracing::warn!("Account {} marked invalid: {}", email, reason);
        self.store.mark_invalid(email, reason).await;
    }

    pub fn clear_expired_limits(&self) -> usize {
        self.ledger.sweep_expired()
    }

    pub fn reset_all_rate_limits(&self) {
        self.ledger.reset_all();
    }

    pub fn get_min_wait_time_ms(&self, model: Option<&str>) -> u64 {
        self.ledger.min_wait_ms(model)
    }

    // Credential lifecycle passthroughs

    pub async fn get_token_for_account(&self, account: &Account) -> Result<String, GatewayError> {
        self.authenticator.get_token_for_account(account).await
    }

    pub async fn get_project_for_account(
        &self,
        account: &Account,
        token: &str,
    ) -> Result<String, GatewayError> {
        self.authenticator.get_project_for_account(account, token).await
    }

    pub fn clear_token_cache(&self, email: Option<&str>) {
        self.authenticator.clear_token_cache(email);
    }

    pub fn clear_project_cache(&self, email: Option<&str>) {
        self.authenticator.clear_project_cache(email);
    }

    pub async fn add_account<F: FnOnce(&str)>(
        &self,
        present_url: F,
    ) -> Result<AddedAccount, GatewayError> {
        self.authenticator.add_account(present_url).await
    }

    pub async fn remove_account(&self, email: &str) -> Result<bool, GatewayError> {
        self.authenticator.remove_account(email).await
    }

    /// Pool snapshot for status endpoints.
    pub async fn pool_status(&self) -> PoolStatus {
        let accounts = self.store.list().await;

        let statuses: Vec<AccountStatus> = accounts
            .iter()
            .map(|a| AccountStatus {
                email: a.email.clone(),
                is_rate_limited: self.ledger.is_limited(&a.email, None),
                is_invalid: a.is_invalid,
            })
            .collect();

        let invalid = statuses.iter().filter(|s| s.is_invalid).count();
        let rate_limited = statuses.iter().filter(|s| s.is_rate_limited && !s.is_invalid).count();
        let available =
            statuses.iter().filter(|s| !s.is_invalid && !s.is_rate_limited).count();

        PoolStatus { total: accounts.len(), available, rate_limited, invalid, accounts: statuses }
    }
}
