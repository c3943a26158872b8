//! Account pool status reporting.

use serde::{Deserialize, Serialize};

/// Snapshot of the account pool, suitable for an admin/status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Total number of stored accounts
    pub total: usize,
    /// Accounts neither invalid nor rate-limited
    pub available: usize,
    /// Accounts currently under a cooldown
    pub rate_limited: usize,
    /// Accounts invalidated this process lifetime
    pub invalid: usize,
    /// Per-account breakdown
    pub accounts: Vec<AccountStatus>,
}

/// Per-account entry in a [`PoolStatus`] report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountStatus {
    /// Account email
    pub email: String,
    /// Whether any cooldown (global or per-model) is active
    pub is_rate_limited: bool,
    /// Whether the account has been invalidated
    pub is_invalid: bool,
}
