//! Account model and on-disk document format.

use serde::{Deserialize, Serialize};

/// A persistently stored OAuth identity (one user's refresh token).
///
/// Accounts are keyed by `email`. The `is_invalid` flag is runtime-only
/// state: it is set when a refresh token is rejected and is intentionally
/// not persisted, so a restart gives the account another chance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    /// Email address identifying the account (unique within the store)
    pub email: String,
    /// OAuth refresh token for renewing access
    pub refresh_token: String,
    /// Google Cloud project ID for API requests, discovered lazily
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Whether the account has been invalidated this process lifetime
    #[serde(skip)]
    pub is_invalid: bool,
    /// Reason the account was invalidated
    #[serde(skip)]
    pub invalid_reason: Option<String>,
}

impl Account {
    /// Create a new account with the given email and refresh token.
    pub fn new(email: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            refresh_token: refresh_token.into(),
            project_id: None,
            is_invalid: false,
            invalid_reason: None,
        }
    }

    /// Mark the account invalid with a reason.
    pub fn mark_invalid(&mut self, reason: impl Into<String>) {
        self.is_invalid = true;
        self.invalid_reason = Some(reason.into());
    }

    /// Clear the invalid flag (e.g. after a successful re-authorization).
    pub fn clear_invalid(&mut self) {
        self.is_invalid = false;
        self.invalid_reason = None;
    }
}

/// On-disk account document (`accounts.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountsFile {
    /// List of stored accounts
    #[serde(default)]
    pub accounts: Vec<Account>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_flag_not_serialized() {
        let mut account = Account::new("a@example.com", "rt-1");
        account.mark_invalid("invalid_grant");

        let json = serde_json::to_string(&account).expect("serializes");
        assert!(!json.contains("is_invalid"));
        assert!(!json.contains("invalid_reason"));

        let restored: Account = serde_json::from_str(&json).expect("deserializes");
        assert!(!restored.is_invalid);
        assert_eq!(restored.invalid_reason, None);
    }

    #[test]
    fn test_accounts_file_tolerates_missing_fields() {
        let doc = r#"{"accounts": [{"email": "a@example.com", "refresh_token": "rt"}]}"#;
        let parsed: AccountsFile = serde_json::from_str(doc).expect("parses");
        assert_eq!(parsed.accounts.len(), 1);
        assert_eq!(parsed.accounts[0].project_id, None);
    }
}
