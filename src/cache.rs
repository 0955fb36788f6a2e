//! In-memory TTL cache for upstream responses.
//!
//! Entries expire at an absolute instant and are only removed when a lookup
//! finds them stale, or when the whole cache is cleared. Nothing bounds the
//! number of entries: keys that are never read again stay resident until
//! [`TtlCache::clear`] runs.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::time::Instant;

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
}

/// Thread-safe key/value store with per-entry expiry.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the value for `key` unless it is absent or expired.
    ///
    /// An expired entry is dropped as a side effect.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write();
        // Another writer may have refreshed the entry between the two locks.
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Inserts or overwrites `key`, expiring `ttl` from now.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().insert(key.into(), entry);
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        let removed = entries.len();
        entries.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.read();
        CacheStats {
            total_entries: entries.len(),
            expired_entries: entries.values().filter(|e| e.is_expired(now)).count(),
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = TtlCache::new();
        cache.set("geocode:a", 7u32, Duration::from_secs(60));
        assert_eq!(cache.get("geocode:a"), Some(7));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("geocode:a"), Some(7));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("geocode:a"), None);
        // Lazy removal on lookup.
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_count_expired_entries() {
        let cache = TtlCache::new();
        cache.set("short", 1u8, Duration::from_secs(1));
        cache.set("long", 2u8, Duration::from_secs(3600));

        tokio::time::advance(Duration::from_secs(5)).await;
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 1);
    }

    #[test]
    fn test_set_overwrites_and_clear() {
        let cache = TtlCache::new();
        cache.set("k", "first".to_string(), Duration::from_secs(10));
        cache.set("k", "second".to_string(), Duration::from_secs(10));
        assert_eq!(cache.get("k").as_deref(), Some("second"));
        assert_eq!(cache.get("missing"), None);

        assert_eq!(cache.clear(), 1);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let cache = Arc::new(TtlCache::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("k{}", i % 16);
                        cache.set(key.clone(), t * 1000 + i, Duration::from_secs(30));
                        assert!(cache.get(&key).is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 16);
    }
}
