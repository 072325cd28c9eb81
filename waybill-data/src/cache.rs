//! Process-local cache with per-entry expiry.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

use waybill_core::Cache;

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Thread-safe in-memory [`Cache`].
///
/// Expired entries are dropped lazily when read. A poisoned lock is
/// recovered rather than propagated: the map holds no invariants a panic
/// could break.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use waybill_core::Cache;
/// use waybill_data::MemoryCache;
///
/// let cache = MemoryCache::default();
/// cache.set("geocode_chicago", "[41.88,-87.63]".to_owned(), Duration::from_secs(60));
/// assert_eq!(cache.get("geocode_chicago").as_deref(), Some("[41.88,-87.63]"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    /// Number of stored entries, including expired ones not yet evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, entry| entry.expires_at > now);
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        if entry.expires_at > Instant::now() {
            return Some(entry.value.clone());
        }
        entries.remove(key);
        None
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        let Some(expires_at) = Instant::now().checked_add(ttl) else {
            return;
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), Entry { value, expires_at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn live_entries_are_returned() {
        let cache = MemoryCache::default();
        cache.set("k", "v".to_owned(), Duration::from_secs(60));

        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }

    #[rstest]
    fn expired_entries_are_evicted_on_read() {
        let cache = MemoryCache::default();
        cache.set("k", "v".to_owned(), Duration::ZERO);

        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[rstest]
    fn later_writes_replace_earlier_ones() {
        let cache = MemoryCache::default();
        cache.set("k", "old".to_owned(), Duration::from_secs(60));
        cache.set("k", "new".to_owned(), Duration::from_secs(60));

        assert_eq!(cache.get("k").as_deref(), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[rstest]
    fn purge_keeps_only_live_entries() {
        let cache = MemoryCache::default();
        cache.set("stale", "v".to_owned(), Duration::ZERO);
        cache.set("fresh", "v".to_owned(), Duration::from_secs(60));

        cache.purge_expired();

        assert_eq!(cache.len(), 1);
        assert!(cache.get("fresh").is_some());
    }

    #[rstest]
    fn unrepresentable_ttl_is_not_stored() {
        let cache = MemoryCache::default();
        cache.set("k", "v".to_owned(), Duration::MAX);

        assert!(cache.is_empty());
    }
}
