//! Access-token and project-id caches.

use dashmap::DashMap;
use std::time::{Duration, SystemTime};

/// Safety margin subtracted from a token's lifetime at insert, so a token is
/// never handed out within a minute of its stated expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: SystemTime,
}

/// Email -> access-token cache.
#[derive(Default)]
pub struct TokenCache {
    cache: DashMap<String, CachedToken>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self { cache: DashMap::new() }
    }

    /// Return the cached token if it is still comfortably valid.
    pub fn get(&self, email: &str) -> Option<String> {
        let entry = self.cache.get(email)?;
        if SystemTime::now() < entry.expires_at {
            Some(entry.access_token.clone())
        } else {
            None
        }
    }

    /// Cache a token. The expiry margin is baked in here, so `get` does a
    /// plain comparison.
    pub fn set(&self, email: &str, access_token: &str, expires_in_secs: u64) {
        let lifetime = Duration::from_secs(expires_in_secs);
        let expires_at = SystemTime::now() + lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN);
        self.cache.insert(
            email.to_string(),
            CachedToken { access_token: access_token.to_string(), expires_at },
        );
    }

    /// Drop one account's token, or all of them.
    pub fn clear(&self, email: Option<&str>) {
        match email {
            Some(email) => {
                self.cache.remove(email);
            },
            None => self.cache.clear(),
        }
    }
}

/// Email -> project-id cache. Pure memoization, no TTL.
#[derive(Default)]
pub struct ProjectCache {
    cache: DashMap<String, String>,
}

impl ProjectCache {
    pub fn new() -> Self {
        Self { cache: DashMap::new() }
    }

    pub fn get(&self, email: &str) -> Option<String> {
        self.cache.get(email).map(|p| p.clone())
    }

    pub fn set(&self, email: &str, project_id: &str) {
        self.cache.insert(email.to_string(), project_id.to_string());
    }

    pub fn clear(&self, email: Option<&str>) {
        match email {
            Some(email) => {
                self.cache.remove(email);
            },
            None => self.cache.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_within_margin_is_expired() {
        let cache = TokenCache::new();

        // 30s lifetime is inside the 60s margin, so the token is born stale
        cache.set("a@x", "tok", 30);
        assert_eq!(cache.get("a@x"), None);

        cache.set("a@x", "tok", 3600);
        assert_eq!(cache.get("a@x").as_deref(), Some("tok"));
    }

    #[test]
    fn test_set_replaces_previous_token() {
        let cache = TokenCache::new();
        cache.set("a@x", "old", 3600);
        cache.set("a@x", "new", 3600);
        assert_eq!(cache.get("a@x").as_deref(), Some("new"));
    }

    #[test]
    fn test_clear_single_and_all() {
        let cache = TokenCache::new();
        cache.set("a@x", "tok-a", 3600);
        cache.set("b@x", "tok-b", 3600);

        cache.clear(Some("a@x"));
        assert_eq!(cache.get("a@x"), None);
        assert_eq!(cache.get("b@x").as_deref(), Some("tok-b"));

        cache.clear(None);
        assert_eq!(cache.get("b@x"), None);
    }

    #[test]
    fn test_project_cache_has_no_ttl() {
        let cache = ProjectCache::new();
        cache.set("a@x", "project-1");
        assert_eq!(cache.get("a@x").as_deref(), Some("project-1"));

        cache.clear(Some("a@x"));
        assert_eq!(cache.get("a@x"), None);
    }
}
