//! In-memory rate-limit ledger.
//!
//! Tracks per-account and per-(account, model) cooldowns observed from
//! upstream 429 responses. An entry whose reset time has passed is
//! equivalent to no entry at all; [`RateLimitLedger::sweep_expired`] reaps
//! such entries opportunistically.

pub mod parser;

use dashmap::DashMap;
use std::time::{Duration, SystemTime};

use crate::config::DEFAULT_COOLDOWN_MS;

/// Key for identifying rate-limited resources.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum LedgerKey {
    /// Cooldown applies to the entire account.
    Account(String),
    /// Cooldown applies to a specific model on an account.
    Model {
        /// Account email.
        account: String,
        /// Model name.
        model: String,
    },
}

impl LedgerKey {
    /// Creates an account-level key.
    pub fn account(email: &str) -> Self {
        LedgerKey::Account(email.to_string())
    }

    /// Creates a model-specific key.
    pub fn model(email: &str, model: &str) -> Self {
        LedgerKey::Model { account: email.to_string(), model: model.to_string() }
    }

    /// Creates a key from an optional model.
    pub fn from_optional_model(email: &str, model: Option<&str>) -> Self {
        match model {
            Some(m) => LedgerKey::model(email, m),
            None => LedgerKey::account(email),
        }
    }
}

impl std::fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerKey::Account(acc) => write!(f, "{}", acc),
            LedgerKey::Model { account, model } => write!(f, "{}:{}", account, model),
        }
    }
}

/// A recorded cooldown.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    /// When the cooldown ends.
    pub reset_time: SystemTime,
    /// Model that triggered the cooldown, if any.
    pub model: Option<String>,
}

/// Concurrent cooldown table shared by all dispatches.
#[derive(Default)]
pub struct RateLimitLedger {
    limits: DashMap<LedgerKey, LedgerEntry>,
}

impl RateLimitLedger {
    pub fn new() -> Self {
        Self { limits: DashMap::new() }
    }

    /// Record a cooldown for an account, optionally scoped to a model.
    /// Without a parsed reset time the default cooldown applies.
    pub fn mark(&self, email: &str, reset_ms: Option<u64>, model: Option<&str>) {
        let cooldown_ms = reset_ms.unwrap_or(DEFAULT_COOLDOWN_MS);
        let reset_time = SystemTime::now() + Duration::from_millis(cooldown_ms);
        let key = LedgerKey::from_optional_model(email, model);

        tracing::info!(
            "Account {} rate-limited for model {} ({}ms cooldown)",
            email,
            model.unwrap_or("all"),
            cooldown_ms
        );
        self.limits.insert(key, LedgerEntry { reset_time, model: model.map(str::to_string) });
    }

    /// Check if an account is limited for a model.
    /// Both the model-specific and the account-level key count.
    pub fn is_limited(&self, email: &str, model: Option<&str>) -> bool {
        let now = SystemTime::now();

        if let Some(m) = model {
            if let Some(entry) = self.limits.get(&LedgerKey::model(email, m)) {
                if entry.reset_time > now {
                    return true;
                }
            }
        }

        if let Some(entry) = self.limits.get(&LedgerKey::account(email)) {
            if entry.reset_time > now {
                return true;
            }
        }

        false
    }

    /// Remaining wait in milliseconds for an account under a model filter:
    /// the larger of the model-specific and account-level residuals.
    pub fn remaining_wait_ms(&self, email: &str, model: Option<&str>) -> u64 {
        let now = SystemTime::now();
        let mut wait_ms: u64 = 0;

        let mut keys = vec![LedgerKey::account(email)];
        if let Some(m) = model {
            keys.push(LedgerKey::model(email, m));
        }

        for key in keys {
            if let Some(entry) = self.limits.get(&key) {
                if let Ok(remaining) = entry.reset_time.duration_since(now) {
                    wait_ms = wait_ms.max(remaining.as_millis() as u64);
                }
            }
        }

        wait_ms
    }

    /// Smallest positive remaining wait across the ledger.
    ///
    /// With a model filter, model-keyed entries for other models are skipped
    /// while account-level entries remain in the scan (an account-level
    /// cooldown blocks every model).
    pub fn min_wait_ms(&self, model: Option<&str>) -> u64 {
        let now = SystemTime::now();
        let mut min_wait: Option<u64> = None;

        for entry in self.limits.iter() {
            if let Some(filter) = model {
                if let LedgerKey::Model { model: entry_model, .. } = entry.key() {
                    if entry_model != filter {
                        continue;
                    }
                }
            }
            if let Ok(remaining) = entry.value().reset_time.duration_since(now) {
                let ms = remaining.as_millis() as u64;
                min_wait = Some(min_wait.map_or(ms, |current| current.min(ms)));
            }
        }

        min_wait.unwrap_or(0)
    }

    /// Delete entries whose reset time is in the past. Returns the number
    /// of reaped entries.
    pub fn sweep_expired(&self) -> usize {
        let now = SystemTime::now();
        let before = self.limits.len();
        self.limits.retain(|_, entry| entry.reset_time > now);
        let reaped = before.saturating_sub(self.limits.len());

        if reaped > 0 {
            tracing::debug!("Cleared {} expired rate limit record(s)", reaped);
        }
        reaped
    }

    /// Empty the ledger.
    pub fn reset_all(&self) {
        let count = self.limits.len();
        self.limits.clear();
        if count > 0 {
            tracing::warn!("Cleared all {} rate limit record(s)", count);
        }
    }

    /// Number of active entries (expired ones included until swept).
    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }
}
