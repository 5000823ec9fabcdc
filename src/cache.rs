//! # Freshness Cache Module
//!
//! Bounded, time-limited caches that keep the wildcard handler from re-stating
//! the filesystem on every request.
//!
//! ## Overview
//!
//! The wildcard handler keeps three independent caches, all keyed by
//! filesystem path and all sharing the same eviction policy:
//!
//! - **stat**: path → [`FileStat`] (size, modification time, file type)
//! - **resolved**: path → the file actually served (a directory resolves to its `index.html`)
//! - **index**: `<dir>/index.html` → present, recorded only once found
//!
//! Static routes never touch these caches; their paths are fixed at build time.
//!
//! ## Eviction
//!
//! - Every entry carries its own expiry (`ttl` from [`FreshnessConfig`])
//! - Expired entries are swept on write, at most once per `check_period`
//! - When `max_keys` is reached, expired entries are swept first, then the
//!   oldest entry is evicted
//!
//! Concurrent writers may briefly push the size past `max_keys` by the number
//! of in-flight inserts; the next insert brings it back down.
//!
//! ## Thread Safety
//!
//! Entries live in a [`DashMap`], so every lookup and update is a key-level
//! atomic operation. Two requests racing on the same miss both hit the
//! filesystem and the last writer wins.

use std::borrow::Borrow;
use std::fs::Metadata;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime};

use dashmap::DashMap;
use serde::Deserialize;
use tracing::debug;

/// Freshness cache tuning shared by all three caches.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FreshnessConfig {
    /// Lifetime of each entry in seconds (default: 3 hours)
    pub ttl_secs: u64,
    /// Minimum interval between sweeps of expired entries in seconds (default: 5 minutes)
    pub check_period_secs: u64,
    /// Maximum number of keys per cache (default: 250)
    pub max_keys: usize,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3 * 60 * 60,
            check_period_secs: 5 * 60,
            max_keys: 250,
        }
    }
}

impl FreshnessConfig {
    /// Entry lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Sweep interval.
    #[must_use]
    pub fn check_period(&self) -> Duration {
        Duration::from_secs(self.check_period_secs)
    }
}

/// A cached value with its expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Cached value
    pub value: V,
    /// Instant after which the entry is no longer served
    pub expires_at: Instant,
    /// Instant the entry was written, used for oldest-first eviction
    pub inserted_at: Instant,
}

/// Concurrent key-value cache with per-entry TTL and a bounded key count.
pub struct TtlCache<K, V> {
    name: &'static str,
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
    check_period: Duration,
    max_keys: usize,
    epoch: Instant,
    /// Milliseconds since `epoch` of the last sweep
    last_sweep_ms: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache from shared tuning.
    #[must_use]
    pub fn new(name: &'static str, config: &FreshnessConfig) -> Self {
        Self::with_limits(name, config.ttl(), config.check_period(), config.max_keys)
    }

    /// Create a cache with explicit limits. `max_keys` is clamped to at least 1.
    #[must_use]
    pub fn with_limits(
        name: &'static str,
        ttl: Duration,
        check_period: Duration,
        max_keys: usize,
    ) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            ttl,
            check_period,
            max_keys: max_keys.max(1),
            epoch: Instant::now(),
            last_sweep_ms: AtomicU64::new(0),
        }
    }

    /// Return the cached value if present and not expired.
    ///
    /// An expired entry is removed on the way out.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, e| e.expires_at <= now);
        }
        None
    }

    /// Insert or refresh a value with a fresh TTL.
    pub fn insert(&self, key: K, value: V) {
        let now = Instant::now();
        self.maybe_sweep(now);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_keys {
            self.sweep_at(now);
            while self.entries.len() >= self.max_keys {
                self.evict_oldest();
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
                inserted_at: now,
            },
        );
    }

    /// Remove every expired entry, returning how many were dropped.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        let removed = before.saturating_sub(self.entries.len());
        self.last_sweep_ms
            .store(self.millis_since_epoch(now), Ordering::Relaxed);
        if removed > 0 {
            debug!(cache = self.name, removed, "Swept expired cache entries");
        }
        removed
    }

    fn maybe_sweep(&self, now: Instant) {
        let now_ms = self.millis_since_epoch(now);
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        let period_ms = u64::try_from(self.check_period.as_millis()).unwrap_or(u64::MAX);
        if now_ms.saturating_sub(last) < period_ms {
            return;
        }
        // Only one writer sweeps per period.
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            self.sweep_at(now);
        }
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.value().inserted_at)
            .map(|e| e.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            debug!(cache = self.name, max_keys = self.max_keys, "Evicted oldest cache entry");
        }
    }

    fn millis_since_epoch(&self, now: Instant) -> u64 {
        u64::try_from(now.saturating_duration_since(self.epoch).as_millis()).unwrap_or(u64::MAX)
    }

    /// Number of stored entries, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Configured key bound.
    #[must_use]
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }
}

/// The parts of a `stat` result the wildcard handler needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Size in bytes
    pub len: u64,
    /// Last modification time, if the platform reports one
    pub modified: Option<SystemTime>,
    /// Whether the path is a directory
    pub is_dir: bool,
    /// Whether the path is a regular file
    pub is_file: bool,
}

impl From<&Metadata> for FileStat {
    fn from(meta: &Metadata) -> Self {
        Self {
            len: meta.len(),
            modified: meta.modified().ok(),
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
        }
    }
}

/// The three caches owned by a wildcard handler.
pub struct FreshnessCaches {
    /// Path → stat result
    pub stat: TtlCache<PathBuf, FileStat>,
    /// Requested path → file actually served
    pub resolved: TtlCache<PathBuf, PathBuf>,
    /// `<dir>/index.html` → present; misses are not recorded
    pub index: TtlCache<PathBuf, bool>,
}

impl FreshnessCaches {
    /// Build all three caches with the same tuning.
    #[must_use]
    pub fn new(config: &FreshnessConfig) -> Self {
        Self {
            stat: TtlCache::new("stat", config),
            resolved: TtlCache::new("resolved", config),
            index: TtlCache::new("index", config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn short_cache(max_keys: usize) -> TtlCache<String, u32> {
        TtlCache::with_limits("test", Duration::from_millis(30), Duration::from_secs(60), max_keys)
    }

    #[test]
    fn test_get_returns_fresh_value() {
        let cache = short_cache(10);
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_entries_expire() {
        let cache = short_cache(10);
        cache.insert("a".to_string(), 1);
        thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.get("a"), None);
        // expired entry is dropped on lookup
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_refreshes_ttl() {
        let cache = short_cache(10);
        cache.insert("a".to_string(), 1);
        thread::sleep(Duration::from_millis(20));
        cache.insert("a".to_string(), 2);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn test_bounded_key_count_evicts_oldest() {
        let cache: TtlCache<String, u32> =
            TtlCache::with_limits("test", Duration::from_secs(60), Duration::from_secs(60), 3);
        for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
            cache.insert(key.to_string(), i as u32);
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("d"), Some(3));
    }

    #[test]
    fn test_full_cache_prefers_sweeping_expired() {
        let cache = short_cache(2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        thread::sleep(Duration::from_millis(60));
        cache.insert("c".to_string(), 3);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_sweep_reports_removed() {
        let cache = short_cache(10);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.sweep(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_writers_stay_bounded() {
        let cache: Arc<TtlCache<String, usize>> = Arc::new(TtlCache::with_limits(
            "test",
            Duration::from_secs(60),
            Duration::from_secs(60),
            16,
        ));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..200 {
                        cache.insert(format!("{t}-{i}"), i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(cache.len() <= 16 + 4);
    }

    #[test]
    fn test_max_keys_clamped() {
        let cache: TtlCache<String, u32> =
            TtlCache::with_limits("test", Duration::from_secs(1), Duration::from_secs(1), 0);
        assert_eq!(cache.max_keys(), 1);
    }

    #[test]
    fn test_default_config() {
        let config = FreshnessConfig::default();
        assert_eq!(config.ttl(), Duration::from_secs(10_800));
        assert_eq!(config.max_keys, 250);
    }
}
