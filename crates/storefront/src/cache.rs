//! Bounded TTL cache for API responses.
//!
//! Avoids refetching the catalog between page navigations. Entries expire
//! after a default max age (or a per-entry override) and the store never
//! holds more than `max_entries`; when full, the entry inserted earliest is
//! evicted regardless of how recently it was read.
//!
//! The cache is never authoritative. Realtime events invalidate matching
//! keys, and flushing it is always safe: callers simply refetch.
//!
//! One `CacheManager` is created by the application root and shared through
//! an `Arc`; there is no process-wide instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use regex::Regex;
use tracing::debug;

use crate::api::types::{Category, CommissionRates, Product, RatingStats};
use crate::config::CacheConfig;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Lets tests exercise expiry without
/// sleeping.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    /// Insertion order, breaks ties between entries stored at the same instant.
    seq: u64,
    max_age: Option<Duration>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant, default_max_age: Duration) -> bool {
        let age = now.saturating_duration_since(self.inserted_at);
        age > self.max_age.unwrap_or(default_max_age)
    }
}

#[derive(Debug)]
struct Entries<V> {
    map: HashMap<String, CacheEntry<V>>,
    next_seq: u64,
}

/// Bounded key/value cache with per-entry TTL and wildcard invalidation.
pub struct CacheManager<V> {
    entries: Mutex<Entries<V>>,
    default_max_age: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> std::fmt::Debug for CacheManager<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("default_max_age", &self.default_max_age)
            .field("max_entries", &self.max_entries)
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

impl<V: Clone> CacheManager<V> {
    /// Create a cache using the wall clock.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache reading time from `clock`.
    #[must_use]
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                next_seq: 0,
            }),
            default_max_age: config.max_age,
            max_entries: config.max_entries.max(1),
            clock,
        }
    }

    /// Return the value for `key` if present and fresh.
    ///
    /// An expired entry is removed on the spot.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let expired = entries
            .map
            .get(key)
            .map(|entry| entry.is_expired(now, self.default_max_age))?;
        if expired {
            entries.map.remove(key);
            debug!(key, "Cache entry expired");
            return None;
        }
        entries.map.get(key).map(|entry| entry.value.clone())
    }

    /// Insert or overwrite `key`.
    ///
    /// `max_age` overrides the default lifetime for this entry only. When the
    /// cache is full and `key` is new, the earliest-inserted entry is evicted
    /// first.
    pub fn set(&self, key: impl Into<String>, value: V, max_age: Option<Duration>) {
        let key = key.into();
        let now = self.clock.now();
        let mut entries = self.lock();

        if !entries.map.contains_key(&key) && entries.map.len() >= self.max_entries {
            let oldest = entries
                .map
                .iter()
                .min_by_key(|(_, entry)| (entry.inserted_at, entry.seq))
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.map.remove(&oldest);
                debug!(evicted = %oldest, "Cache full, evicted oldest entry");
            }
        }

        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.map.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                seq,
                max_age,
            },
        );
    }

    /// Remove `key`. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().map.remove(key).is_some()
    }

    /// Remove `key` exactly, or every key matching a `*` wildcard pattern.
    ///
    /// `*` matches any run of characters (including none); every other
    /// character matches literally and the whole key must match. Returns the
    /// number of entries removed.
    pub fn invalidate(&self, key_or_pattern: &str) -> usize {
        let mut entries = self.lock();
        let mut removed = usize::from(entries.map.remove(key_or_pattern).is_some());

        if key_or_pattern.contains('*')
            && let Some(regex) = wildcard_regex(key_or_pattern)
        {
            let before = entries.map.len();
            entries.map.retain(|key, _| !regex.is_match(key));
            removed += before - entries.map.len();
        }

        if removed > 0 {
            debug!(pattern = key_or_pattern, removed, "Cache invalidated");
        }
        removed
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.map.len();
        entries
            .map
            .retain(|_, entry| !entry.is_expired(now, self.default_max_age));
        before - entries.map.len()
    }

    /// Empty the cache.
    pub fn clear(&self) {
        self.lock().map.clear();
    }

    /// Number of entries currently stored, fresh or not.
    pub fn size(&self) -> usize {
        self.lock().map.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Configured capacity.
    #[must_use]
    pub const fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn lock(&self) -> MutexGuard<'_, Entries<V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Compile `orders:*` style patterns into an anchored regex.
fn wildcard_regex(pattern: &str) -> Option<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$")).ok()
}

// =============================================================================
// Catalog cache
// =============================================================================

/// Values the storefront services keep in the cache.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Vec<Product>),
    Product(Box<Product>),
    Categories(Vec<Category>),
    Commissions(CommissionRates),
    RatingStats(RatingStats),
}

/// Cache shared by the storefront services.
pub type CatalogCache = CacheManager<CacheValue>;

/// Cache key builders, one per request signature.
pub mod keys {
    use bazaar_core::ProductId;

    /// Approved catalog shown on the home page.
    pub const HOME_PRODUCTS: &str = "products:home";
    /// Every product-derived entry.
    pub const ALL_PRODUCTS: &str = "products:*";
    /// Category list.
    pub const CATEGORIES: &str = "categories:all";
    /// Commission rate table.
    pub const COMMISSIONS: &str = "categories:commissions";

    /// A single product.
    #[must_use]
    pub fn product(id: &ProductId) -> String {
        format!("products:{id}")
    }

    /// Rating statistics for a product.
    #[must_use]
    pub fn rating_stats(id: &ProductId) -> String {
        format!("ratings:{id}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cache_with(max_entries: usize, max_age: Duration) -> (CacheManager<i32>, ManualClock) {
        let clock = ManualClock::new();
        let cache = CacheManager::with_clock(
            CacheConfig {
                max_age,
                max_entries,
            },
            Arc::new(clock.clone()),
        );
        (cache, clock)
    }

    #[test]
    fn test_set_then_get() {
        let (cache, _) = cache_with(10, Duration::from_secs(60));
        cache.set("k", 7, None);
        assert_eq!(cache.get("k"), Some(7));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let (cache, _) = cache_with(10, Duration::from_secs(60));
        cache.set("k", 1, None);
        cache.set("k", 2, None);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_default_max_age_expiry_removes_entry() {
        let (cache, clock) = cache_with(10, Duration::from_secs(300));
        cache.set("k", 1, None);

        clock.advance(Duration::from_secs(300));
        assert_eq!(cache.get("k"), Some(1), "still visible at exactly max age");

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.size(), 0, "expired entry is physically removed");
    }

    #[test]
    fn test_custom_max_age_overrides_default() {
        let (cache, clock) = cache_with(10, Duration::from_secs(300));
        cache.set("short", 1, Some(Duration::from_secs(5)));
        cache.set("long", 2, Some(Duration::from_secs(900)));
        cache.set("default", 3, None);

        clock.advance(Duration::from_secs(6));
        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("default"), Some(3));

        clock.advance(Duration::from_secs(400));
        assert_eq!(cache.get("default"), None);
        assert_eq!(cache.get("long"), Some(2));
    }

    #[test]
    fn test_capacity_evicts_oldest_inserted() {
        let (cache, _) = cache_with(2, Duration::from_secs(60));
        cache.set("p", 1, None);
        cache.set("q", 2, None);
        cache.set("r", 3, None);

        assert_eq!(cache.get("p"), None);
        assert_eq!(cache.get("q"), Some(2));
        assert_eq!(cache.get("r"), Some(3));
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn test_eviction_ignores_reads() {
        let (cache, clock) = cache_with(2, Duration::from_secs(60));
        cache.set("a", 1, None);
        clock.advance(Duration::from_secs(1));
        cache.set("b", 2, None);

        // Reading "a" does not make it younger
        assert_eq!(cache.get("a"), Some(1));
        cache.set("c", 3, None);

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let (cache, _) = cache_with(2, Duration::from_secs(60));
        cache.set("a", 1, None);
        cache.set("b", 2, None);
        cache.set("a", 10, None);

        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let (cache, _) = cache_with(5, Duration::from_secs(60));
        for i in 0..50 {
            cache.set(format!("key:{i}"), i, None);
            assert!(cache.size() <= 5);
        }
        assert_eq!(cache.get("key:44"), None);
        assert_eq!(cache.get("key:45"), Some(45));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (cache, _) = cache_with(10, Duration::from_secs(60));
        cache.set("k", 1, None);
        assert!(cache.delete("k"));
        assert!(!cache.delete("k"));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_invalidate_wildcard() {
        let (cache, _) = cache_with(10, Duration::from_secs(60));
        cache.set("orders:1", 1, None);
        cache.set("orders:page:2", 2, None);
        cache.set("orders:", 3, None);
        cache.set("products:1", 4, None);
        cache.set("my-orders:1", 5, None);

        assert_eq!(cache.invalidate("orders:*"), 3);
        assert_eq!(cache.get("orders:1"), None);
        assert_eq!(cache.get("orders:page:2"), None);
        assert_eq!(cache.get("orders:"), None);
        assert_eq!(cache.get("products:1"), Some(4));
        assert_eq!(cache.get("my-orders:1"), Some(5));
    }

    #[test]
    fn test_invalidate_exact_key() {
        let (cache, _) = cache_with(10, Duration::from_secs(60));
        cache.set("products:1", 1, None);
        cache.set("products:10", 2, None);

        assert_eq!(cache.invalidate("products:1"), 1);
        assert_eq!(cache.get("products:10"), Some(2));
    }

    #[test]
    fn test_invalidate_treats_regex_characters_literally() {
        let (cache, _) = cache_with(10, Duration::from_secs(60));
        cache.set("a.b:1", 1, None);
        cache.set("axb:1", 2, None);
        cache.set("(x:1", 3, None);

        assert_eq!(cache.invalidate("a.b:*"), 1);
        assert_eq!(cache.get("axb:1"), Some(2));

        // Unbalanced parenthesis is not a malformed pattern here
        assert_eq!(cache.invalidate("(x:*"), 1);
        assert_eq!(cache.invalidate("[unclosed"), 0);
    }

    #[test]
    fn test_wildcard_in_middle() {
        let (cache, _) = cache_with(10, Duration::from_secs(60));
        cache.set("ratings:1:stats", 1, None);
        cache.set("ratings:2:stats", 2, None);
        cache.set("ratings:2:mine", 3, None);

        assert_eq!(cache.invalidate("ratings:*:stats"), 2);
        assert_eq!(cache.get("ratings:2:mine"), Some(3));
    }

    #[test]
    fn test_purge_expired_and_clear() {
        let (cache, clock) = cache_with(10, Duration::from_secs(10));
        cache.set("old", 1, None);
        clock.advance(Duration::from_secs(8));
        cache.set("new", 2, None);
        clock.advance(Duration::from_secs(5));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.size(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_debug_reports_size() {
        let (cache, _) = cache_with(4, Duration::from_secs(60));
        cache.set("a", 1, None);
        cache.set("b", 2, None);
        let rendered = format!("{cache:?}");
        assert!(rendered.starts_with("CacheManager"));
        assert!(rendered.contains("max_entries: 4"));
        assert!(rendered.contains("size: 2"));
    }

    #[test]
    fn test_key_builders() {
        let id = bazaar_core::ProductId::new("p1");
        assert_eq!(keys::product(&id), "products:p1");
        assert_eq!(keys::rating_stats(&id), "ratings:p1");
        assert!(wildcard_regex(keys::ALL_PRODUCTS).unwrap().is_match(keys::HOME_PRODUCTS));
        assert!(!wildcard_regex(keys::ALL_PRODUCTS).unwrap().is_match(keys::CATEGORIES));
    }
}
