//! Flat dotted-key memo sitting in front of the translation tree
//!
//! Never authoritative: a miss always falls through to the [`KeyStore`]
//! and the resolved value is written back. Bounded by the total key
//! count, so there is no eviction policy beyond explicit invalidation.
//!
//! [`KeyStore`]: crate::keystore::KeyStore

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Hit/miss counters for the flat cache
#[derive(Debug, Default)]
pub struct FlatCacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl FlatCacheMetrics {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }

    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }
}

/// O(1) key→string memo, safe for concurrent readers
#[derive(Debug, Default)]
pub struct FlatCache {
    entries: RwLock<HashMap<String, String>>,
    metrics: FlatCacheMetrics,
}

impl FlatCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a memoized value
    pub fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some(value) => {
                self.metrics.hits.fetch_add(1, Ordering::Relaxed);
                Some(value.clone())
            }
            None => {
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Write-through a resolved value
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().insert(key.into(), value.into());
    }

    /// Drop every memoized entry
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.write();
        let dropped = entries.len() as u64;
        entries.clear();
        self.metrics
            .invalidations
            .fetch_add(dropped, Ordering::Relaxed);
    }

    /// Drop a single entry
    pub fn invalidate(&self, key: &str) {
        if self.entries.write().remove(key).is_some() {
            self.metrics.invalidations.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Drop every entry whose key starts with `prefix`
    pub fn invalidate_by_prefix(&self, prefix: &str) {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let dropped = (before - entries.len()) as u64;
        self.metrics
            .invalidations
            .fetch_add(dropped, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn metrics(&self) -> &FlatCacheMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_then_write_through() {
        let cache = FlatCache::new();
        assert_eq!(cache.get("common.ok"), None);
        cache.set("common.ok", "OK");
        assert_eq!(cache.get("common.ok"), Some("OK".to_string()));
        assert_eq!(cache.metrics().hits(), 1);
        assert_eq!(cache.metrics().misses(), 1);
    }

    #[test]
    fn test_invalidate_single_key() {
        let cache = FlatCache::new();
        cache.set("a.b", "1");
        cache.set("a.c", "2");
        cache.invalidate("a.b");
        assert_eq!(cache.get("a.b"), None);
        assert_eq!(cache.get("a.c"), Some("2".to_string()));
    }

    #[test]
    fn test_invalidate_by_prefix() {
        let cache = FlatCache::new();
        cache.set("common.ok", "OK");
        cache.set("common.cancel", "Cancel");
        cache.set("home.title", "Home");
        cache.invalidate_by_prefix("common.");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("home.title"), Some("Home".to_string()));
        assert_eq!(cache.metrics().invalidations(), 2);
    }

    #[test]
    fn test_invalidate_all() {
        let cache = FlatCache::new();
        cache.set("a", "1");
        cache.set("b", "2");
        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_hit_rate() {
        let cache = FlatCache::new();
        cache.set("k", "v");
        cache.get("k");
        cache.get("absent");
        assert!((cache.metrics().hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
