//! Cache of resolved custom domains.
//!
//! Entries are never evicted. A stale entry is reported as absent and is
//! replaced by the next successful `put` for the same hostname.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::access::Access;
use crate::records::RootPath;

/// A resolved hostname
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub access: Access,
    pub root: RootPath,
    pub resolved_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.resolved_at.elapsed() < ttl
    }
}

/// Hostname -> (access, root) mapping shared by all in-flight requests.
///
/// A single lock guards the map for reads and writes. It is only held for
/// the map operation itself, never across I/O.
#[derive(Debug)]
pub struct CredentialCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl CredentialCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the entry for a hostname, if present and still fresh
    pub fn get(&self, hostname: &str) -> Option<CacheEntry> {
        let entries = self.entries.lock();
        entries
            .get(hostname)
            .filter(|entry| entry.is_fresh(self.ttl))
            .cloned()
    }

    /// Record a resolution for a hostname, stamped with the current time
    pub fn put(&self, hostname: &str, access: Access, root: RootPath) {
        let entry = CacheEntry {
            access,
            root,
            resolved_at: Instant::now(),
        };
        self.entries.lock().insert(hostname.to_string(), entry);
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, root: &str) -> (Access, RootPath) {
        (
            Access::new("sat.example.com:7777", key),
            RootPath::parse(root).unwrap(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_basic() {
        let cache = CredentialCache::new(Duration::from_secs(60));
        assert!(cache.get("example.com").is_none());

        let (access, root) = entry("key-1", "bucket/site");
        cache.put("example.com", access.clone(), root.clone());

        let cached = cache.get("example.com").unwrap();
        assert_eq!(cached.access, access);
        assert_eq!(cached.root, root);
        assert!(cache.get("other.com").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expiry() {
        let cache = CredentialCache::new(Duration::from_secs(60));
        let (access, root) = entry("key-1", "bucket");
        cache.put("example.com", access, root);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get("example.com").is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("example.com").is_none());
        // stale entries stay stored until superseded
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_put_replaces() {
        let cache = CredentialCache::new(Duration::from_secs(60));
        let (access, root) = entry("key-1", "bucket");
        cache.put("example.com", access, root);

        tokio::time::advance(Duration::from_secs(120)).await;
        assert!(cache.get("example.com").is_none());

        let (access, root) = entry("key-2", "other/prefix");
        cache.put("example.com", access.clone(), root.clone());

        assert_eq!(cache.len(), 1);
        let cached = cache.get("example.com").unwrap();
        assert_eq!(cached.access, access);
        assert_eq!(cached.root.bucket(), "other");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_zero_ttl() {
        let cache = CredentialCache::new(Duration::ZERO);
        let (access, root) = entry("key-1", "bucket");
        cache.put("example.com", access, root);
        assert!(cache.get("example.com").is_none());
    }
}
