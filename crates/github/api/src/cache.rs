//! Short-lived repo-access cache for lockdown-mode checks.

use crate::client::{ApiClients, ClientError};
use octomcp_core::CallContext;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// TTL-evicted map of `owner/repo` → viewer-can-push. A zero TTL disables
/// caching entirely. Entries expire by TTL only; there is no capacity bound
/// and writes do not invalidate.
#[derive(Debug)]
pub struct RepoAccessCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, bool)>>,
}

impl RepoAccessCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The default five-minute TTL.
    pub fn default_ttl() -> Duration {
        Duration::from_secs(300)
    }

    fn key(owner: &str, repo: &str) -> String {
        format!("{}/{}", owner.to_lowercase(), repo.to_lowercase())
    }

    pub fn get(&self, owner: &str, repo: &str) -> Option<bool> {
        if self.ttl.is_zero() {
            return None;
        }
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let key = Self::key(owner, repo);
        match entries.get(&key) {
            Some((inserted, allowed)) if inserted.elapsed() < self.ttl => Some(*allowed),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, owner: &str, repo: &str, allowed: bool) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert(Self::key(owner, repo), (Instant::now(), allowed));
    }
}

/// Whether the authenticated viewer can push to `owner/repo`, memoized in
/// the cache. Lockdown mode uses this to decide if file contents may be
/// returned. Failures to determine access count as "no push access".
pub async fn viewer_can_push(
    clients: &ApiClients,
    cache: &RepoAccessCache,
    ctx: &CallContext,
    owner: &str,
    repo: &str,
) -> Result<bool, ClientError> {
    if let Some(cached) = cache.get(owner, repo) {
        return Ok(cached);
    }
    let snapshot = clients
        .rest
        .get(ctx, &format!("repos/{owner}/{repo}"), &[])
        .await?;
    let allowed = snapshot.ok()
        && snapshot
            .json::<Value>()
            .ok()
            .and_then(|v| v.pointer("/permissions/push").and_then(Value::as_bool))
            .unwrap_or(false);
    cache.insert(owner, repo, allowed);
    Ok(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_within_ttl() {
        let cache = RepoAccessCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("acme", "widget"), None);
        cache.insert("acme", "widget", true);
        assert_eq!(cache.get("acme", "widget"), Some(true));
    }

    #[test]
    fn keys_are_case_insensitive() {
        let cache = RepoAccessCache::new(Duration::from_secs(60));
        cache.insert("Acme", "Widget", false);
        assert_eq!(cache.get("acme", "widget"), Some(false));
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = RepoAccessCache::new(Duration::from_millis(10));
        cache.insert("acme", "widget", true);
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get("acme", "widget"), None);
    }

    #[test]
    fn zero_ttl_disables_the_cache() {
        let cache = RepoAccessCache::new(Duration::ZERO);
        cache.insert("acme", "widget", true);
        assert_eq!(cache.get("acme", "widget"), None);
    }
}
