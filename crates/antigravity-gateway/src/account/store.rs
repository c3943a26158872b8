//! JSON-backed account storage.
//!
//! Accounts live in a single pretty-printed document at a configurable path.
//! Writes go through a temp file and an atomic rename so concurrent readers
//! never observe a torn document. The `is_invalid` flag is runtime-only and
//! never reaches disk.

use std::path::{Path, PathBuf};

use antigravity_types::{Account, AccountsFile, GatewayError};
use tokio::sync::RwLock;

/// Persistent account list with an in-memory working copy.
pub struct AccountStore {
    path: PathBuf,
    accounts: RwLock<Vec<Account>>,
}

impl AccountStore {
    /// Load the store from disk. A missing file yields an empty pool; an
    /// unreadable or unparsable file is logged and treated as empty rather
    /// than aborting startup.
    pub async fn load(path: PathBuf) -> Self {
        let accounts = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<AccountsFile>(&raw) {
                Ok(doc) => doc.accounts,
                Err(e) => {
                    tracing::warn!("Failed to parse accounts file {}: {}", path.display(), e);
                    Vec::new()
                },
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read accounts file {}: {}", path.display(), e);
                Vec::new()
            },
        };

        tracing::debug!("Loaded {} account(s) from {}", accounts.len(), path.display());
        Self { path, accounts: RwLock::new(accounts) }
    }

    /// Snapshot of the account list, safe to iterate while the store mutates.
    pub async fn list(&self) -> Vec<Account> {
        self.accounts.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Look up an account by email.
    pub async fn get(&self, email: &str) -> Option<Account> {
        self.accounts.read().await.iter().find(|a| a.email == email).cloned()
    }

    /// Insert or update an account by email and persist the document.
    /// Re-authorizing an existing account clears its invalid flag.
    pub async fn upsert(&self, account: Account) -> Result<(), GatewayError> {
        let mut accounts = self.accounts.write().await;
        match accounts.iter_mut().find(|a| a.email == account.email) {
            Some(existing) => {
                existing.refresh_token = account.refresh_token;
                if account.project_id.is_some() {
                    existing.project_id = account.project_id;
                }
                existing.clear_invalid();
            },
            None => accounts.push(account),
        }
        save_document(&self.path, &accounts).await
    }

    /// Remove an account by email. Returns whether anything was removed.
    pub async fn remove(&self, email: &str) -> Result<bool, GatewayError> {
        let mut accounts = self.accounts.write().await;
        let before = accounts.len();
        accounts.retain(|a| a.email != email);
        if accounts.len() == before {
            return Ok(false);
        }
        save_document(&self.path, &accounts).await?;
        Ok(true)
    }

    /// Flag an account invalid for the rest of this process lifetime.
    /// Deliberately not persisted.
    pub async fn mark_invalid(&self, email: &str, reason: &str) {
        let mut accounts = self.accounts.write().await;
        if let Some(account) = accounts.iter_mut().find(|a| a.email == email) {
            account.mark_invalid(reason);
        }
    }

    /// Record a discovered project id and persist it.
    pub async fn set_project_id(&self, email: &str, project_id: &str) -> Result<(), GatewayError> {
        let mut accounts = self.accounts.write().await;
        if let Some(account) = accounts.iter_mut().find(|a| a.email == email) {
            account.project_id = Some(project_id.to_string());
        }
        save_document(&self.path, &accounts).await
    }
}

async fn save_document(path: &Path, accounts: &[Account]) -> Result<(), GatewayError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| GatewayError::Storage {
            message: format!("Failed to create {}: {}", parent.display(), e),
        })?;
    }

    let document = AccountsFile { accounts: accounts.to_vec() };
    let json = serde_json::to_string_pretty(&document)
        .map_err(|e| GatewayError::Storage { message: format!("JSON serialize: {}", e) })?;

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, &json).await.map_err(|e| GatewayError::Storage {
        message: format!("Failed to write temp file: {}", e),
    })?;
    tokio::fs::rename(&temp_path, path).await.map_err(|e| GatewayError::Storage {
        message: format!("Failed to rename accounts file: {}", e),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("accounts.json")
    }

    #[tokio::test]
    async fn test_load_missing_file_yields_empty_pool() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AccountStore::load(temp_store_path(&dir)).await;
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_load_corrupt_file_yields_empty_pool() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = temp_store_path(&dir);
        tokio::fs::write(&path, "{not json").await.expect("write");

        let store = AccountStore::load(path).await;
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_upsert_persists_and_reloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = temp_store_path(&dir);

        let store = AccountStore::load(path.clone()).await;
        let mut account = Account::new("a@example.com", "rt-1");
        account.project_id = Some("project-1".to_string());
        store.upsert(account).await.expect("upsert");

        let reloaded = AccountStore::load(path).await;
        let accounts = reloaded.list().await;
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].email, "a@example.com");
        assert_eq!(accounts[0].project_id.as_deref(), Some("project-1"));
    }

    #[tokio::test]
    async fn test_upsert_updates_existing_and_clears_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AccountStore::load(temp_store_path(&dir)).await;

        store.upsert(Account::new("a@example.com", "rt-old")).await.expect("insert");
        store.mark_invalid("a@example.com", "invalid_grant").await;
        assert!(store.get("a@example.com").await.expect("present").is_invalid);

        store.upsert(Account::new("a@example.com", "rt-new")).await.expect("update");

        let account = store.get("a@example.com").await.expect("present");
        assert_eq!(account.refresh_token, "rt-new");
        assert!(!account.is_invalid);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_flag_survives_in_memory_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = temp_store_path(&dir);

        let store = AccountStore::load(path.clone()).await;
        store.upsert(Account::new("a@example.com", "rt")).await.expect("insert");
        store.mark_invalid("a@example.com", "refresh rejected").await;
        // Force a save through an unrelated mutation
        store.set_project_id("a@example.com", "p-1").await.expect("save");

        let reloaded = AccountStore::load(path).await;
        let account = reloaded.get("a@example.com").await.expect("present");
        assert!(!account.is_invalid);
        assert_eq!(account.invalid_reason, None);
    }

    #[tokio::test]
    async fn test_remove_account() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AccountStore::load(temp_store_path(&dir)).await;

        store.upsert(Account::new("a@example.com", "rt")).await.expect("insert");
        assert!(store.remove("a@example.com").await.expect("remove"));
        assert!(!store.remove("a@example.com").await.expect("second remove"));
        assert_eq!(store.count().await, 0);
    }
}
